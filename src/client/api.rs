use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::error::{ClientError, ClientResult};
use super::token_store::TokenStore;
use crate::dto::auth_dto::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::dto::dashboard_dto::{AnalyticsResponse, SessionHistoryItem};
use crate::dto::interview_dto::{
    SessionResponse, StartInterviewRequest, SubmitAnswerRequest, SubmitAnswerResponse,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the MockMate API.
///
/// Successful register/login calls store the issued token; logout clears it.
#[derive(Clone)]
pub struct MockMateClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl MockMateClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_http(http, base_url, tokens))
    }

    pub fn with_http(
        http: Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.tokens.load(), Ok(Some(_)))
    }

    pub async fn register(&self, payload: &RegisterRequest) -> ClientResult<TokenResponse> {
        payload.validate()?;
        let req = self.http.post(self.url("/api/v1/auth/register")).json(payload);
        let token: TokenResponse = self.send(req).await?;
        self.tokens.save(&token.access_token)?;
        Ok(token)
    }

    pub async fn login(&self, payload: &LoginRequest) -> ClientResult<TokenResponse> {
        payload.validate()?;
        let req = self.http.post(self.url("/api/v1/auth/login")).json(payload);
        let token: TokenResponse = self.send(req).await?;
        self.tokens.save(&token.access_token)?;
        Ok(token)
    }

    /// Revokes the token server-side and always forgets it locally. A token
    /// the server already rejects counts as logged out.
    pub async fn logout(&self) -> ClientResult<()> {
        let Some(token) = self.tokens.load()? else {
            return Ok(());
        };
        let result = self
            .execute(self.http.post(self.url("/api/v1/auth/logout")).bearer_auth(token))
            .await;
        self.tokens.clear()?;
        match result {
            Ok(_) | Err(ClientError::Unauthorized(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn me(&self) -> ClientResult<UserResponse> {
        let req = self.authed(self.http.get(self.url("/api/v1/auth/me")))?;
        self.send(req).await
    }

    pub async fn start_interview(
        &self,
        payload: &StartInterviewRequest,
    ) -> ClientResult<SessionResponse> {
        payload.validate()?;
        let req = self.authed(self.http.post(self.url("/api/v1/interviews/start")).json(payload))?;
        self.send(req).await
    }

    pub async fn get_session(&self, session_id: Uuid) -> ClientResult<SessionResponse> {
        let req = self.authed(
            self.http
                .get(self.url(&format!("/api/v1/interviews/{}", session_id))),
        )?;
        self.send(req).await
    }

    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        question_id: Uuid,
        answer: &str,
    ) -> ClientResult<SubmitAnswerResponse> {
        let payload = SubmitAnswerRequest {
            answer: answer.to_string(),
        };
        payload.validate()?;
        let path = format!(
            "/api/v1/interviews/{}/questions/{}/answer",
            session_id, question_id
        );
        let req = self.authed(self.http.post(self.url(&path)).json(&payload))?;
        self.send(req).await
    }

    pub async fn history(&self, limit: Option<i64>) -> ClientResult<Vec<SessionHistoryItem>> {
        let mut req = self.http.get(self.url("/api/v1/dashboard/history"));
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        self.send(self.authed(req)?).await
    }

    pub async fn analytics(&self) -> ClientResult<AnalyticsResponse> {
        let req = self.authed(self.http.get(self.url("/api/v1/dashboard/analytics")))?;
        self.send(req).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder) -> ClientResult<RequestBuilder> {
        let token = self
            .tokens
            .load()?
            .ok_or_else(|| ClientError::Unauthorized("not signed in".into()))?;
        Ok(req.bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let resp = self.execute(req).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn execute(&self, req: RequestBuilder) -> ClientResult<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = error_message(status, &text);
        tracing::debug!(status = %status, %message, "request rejected");
        Err(ClientError::from_status(status, message))
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::token_store::MemoryTokenStore;

    #[test]
    fn error_message_prefers_json_body() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"Email already registered."}"#),
            "Email already registered."
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream broke"), "upstream broke");
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[tokio::test]
    async fn calls_without_token_fail_before_sending() {
        let client =
            MockMateClient::new("http://127.0.0.1:9/", Arc::new(MemoryTokenStore::new())).unwrap();
        assert!(!client.is_authenticated());
        assert!(matches!(client.me().await, Err(ClientError::Unauthorized(_))));
        assert!(client.logout().await.is_ok());
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected_locally() {
        let client =
            MockMateClient::new("http://127.0.0.1:9", Arc::new(MemoryTokenStore::new())).unwrap();
        let err = client
            .login(&LoginRequest {
                email: "nope".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
