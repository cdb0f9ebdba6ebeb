pub mod auth_dto;
pub mod dashboard_dto;
pub mod interview_dto;
