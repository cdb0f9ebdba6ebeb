pub mod auth;
pub mod dashboard;
pub mod docs;
pub mod health;
pub mod interview;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::require_bearer_auth,
    cors::cors_layer,
    rate_limit::{rate_limit_middleware, RateLimiter},
};
use crate::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The full HTTP surface with middleware applied.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    let base_routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/openapi.json", get(docs::openapi_json));

    let public_auth = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .layer(from_fn_with_state(
            RateLimiter::per_second(config.auth_rps)
                .trust_forwarded_for(config.trust_proxy_headers),
            rate_limit_middleware,
        ));

    // scoring and generation hit the LLM; limited per user
    let ai_routes = Router::new()
        .route("/api/v1/interviews/start", post(interview::start_interview))
        .route(
            "/api/v1/interviews/:session_id/questions/:question_id/answer",
            post(interview::submit_answer),
        )
        .layer(from_fn_with_state(
            RateLimiter::per_minute(config.ai_requests_per_minute)
                .trust_forwarded_for(config.trust_proxy_headers),
            rate_limit_middleware,
        ));

    let protected = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/dashboard/history", get(dashboard::history))
        .route("/api/v1/dashboard/analytics", get(dashboard::analytics))
        .route("/api/v1/interviews/history", get(dashboard::history))
        .route("/api/v1/interviews/analytics", get(dashboard::analytics))
        .route("/api/v1/interviews/:session_id", get(interview::get_session))
        .merge(ai_routes)
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    base_routes
        .merge(public_auth)
        .merge(protected)
        .with_state(state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
