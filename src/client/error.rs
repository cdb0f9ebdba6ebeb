use reqwest::StatusCode;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failures surfaced to callers of the client, grouped the way a UI shows
/// them.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("The request timed out")]
    Timeout,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Token cache error: {0}")]
    Cache(String),

    #[error("AI response could not be used: {0}")]
    AiResponse(String),
}

impl ClientError {
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            StatusCode::BAD_GATEWAY => ClientError::AiResponse(message),
            StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => ClientError::Timeout,
            other => ClientError::Server {
                status: other.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Server {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: format!("unexpected response body: {}", err),
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl From<crate::models::session::InvalidTransition> for ClientError {
    fn from(err: crate::models::session::InvalidTransition) -> Self {
        ClientError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_taxonomy() {
        let m = |s: StatusCode| ClientError::from_status(s, "msg".into());
        assert!(matches!(m(StatusCode::UNAUTHORIZED), ClientError::Unauthorized(_)));
        assert!(matches!(m(StatusCode::FORBIDDEN), ClientError::Unauthorized(_)));
        assert!(matches!(m(StatusCode::BAD_REQUEST), ClientError::Validation(_)));
        assert!(matches!(m(StatusCode::CONFLICT), ClientError::Validation(_)));
        assert!(matches!(m(StatusCode::UNPROCESSABLE_ENTITY), ClientError::Validation(_)));
        assert!(matches!(m(StatusCode::BAD_GATEWAY), ClientError::AiResponse(_)));
        assert!(matches!(m(StatusCode::GATEWAY_TIMEOUT), ClientError::Timeout));
        assert!(matches!(
            m(StatusCode::SERVICE_UNAVAILABLE),
            ClientError::Server { status: 503, .. }
        ));
    }
}
