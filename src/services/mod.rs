pub mod ai_service;
pub mod analytics_service;
pub mod auth_service;
pub mod interview_service;
