pub mod client;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{
    ai_service::AIService, analytics_service::AnalyticsService, auth_service::AuthService,
    interview_service::InterviewService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub interview_service: InterviewService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.llm_timeout_secs.max(1) * 2))
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {}", e)))?;

        let ai_service = AIService::new(http_client, &config);
        let auth_service = AuthService::new(
            pool.clone(),
            config.jwt_secret.clone(),
            config.access_token_expire_minutes,
        );
        let interview_service = InterviewService::new(pool.clone(), ai_service);
        let analytics_service = AnalyticsService::new(pool);

        Ok(Self {
            config: Arc::new(config),
            auth_service,
            interview_service,
            analytics_service,
        })
    }
}
