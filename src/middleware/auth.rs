use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::utils::token::{decode_access_token, Claims};
use crate::AppState;

fn reject(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Validates the bearer token and stores its [`Claims`] in the request
/// extensions. Revoked tokens are refused.
pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(AUTHORIZATION) else {
        return reject("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return reject("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return reject("unsupported_scheme");
    };

    let claims: Claims = match decode_access_token(token.trim(), &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(_) => return reject("invalid_token"),
    };
    let Ok(jti) = claims.token_id() else {
        return reject("invalid_token");
    };

    match state.auth_service.is_revoked(jti).await {
        Ok(false) => {}
        Ok(true) => return reject("token_revoked"),
        Err(e) => return e.into_response(),
    }

    req.extensions_mut().insert(claims);
    next.run(req).await
}
