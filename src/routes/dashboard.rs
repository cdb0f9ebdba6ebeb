use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::dashboard_dto::HistoryQuery,
    error::Result,
    utils::token::Claims,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/history",
    params(HistoryQuery),
    responses((status = 200, description = "Completed sessions, newest first", body = [crate::dto::dashboard_dto::SessionHistoryItem])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse> {
    let items = state
        .analytics_service
        .history(claims.user_id()?, query.effective_limit())
        .await?;
    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/analytics",
    responses((status = 200, description = "Aggregate scores and 7-day trend", body = crate::dto::dashboard_dto::AnalyticsResponse)),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let analytics = state.analytics_service.analytics(claims.user_id()?).await?;
    Ok(Json(analytics))
}
