//! Backend simulation service contract and its HTTP adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use shared::{
    domain::{Difficulty, SessionId},
    protocol::{AdvanceTurnRequest, CreateSessionRequest, PolicySet, TurnResult},
};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service answered with a non-success status; the body text
    /// is carried verbatim.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    /// The call itself could not complete.
    #[error("request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Stateless remote operations of the simulation service. Retries are
/// a caller decision; nothing here is retried or cached.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Creates a session and runs its initial turn.
    async fn create_session(
        &self,
        difficulty: Difficulty,
        seed: Option<i64>,
    ) -> Result<TurnResult, GatewayError>;

    /// Submits the full staged policy set and computes one step.
    async fn advance_turn(
        &self,
        session_id: &SessionId,
        policies: &PolicySet,
    ) -> Result<TurnResult, GatewayError>;

    /// Discards the server-side session. Best-effort cleanup.
    async fn abandon_session(&self, session_id: &SessionId) -> Result<(), GatewayError>;
}

pub struct HttpBackendGateway {
    http: Client,
    base_url: String,
}

impl HttpBackendGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BackendGateway for HttpBackendGateway {
    async fn create_session(
        &self,
        difficulty: Difficulty,
        seed: Option<i64>,
    ) -> Result<TurnResult, GatewayError> {
        self.post_json(
            "/api/v1/games",
            &CreateSessionRequest { difficulty, seed },
        )
        .await
    }

    async fn advance_turn(
        &self,
        session_id: &SessionId,
        policies: &PolicySet,
    ) -> Result<TurnResult, GatewayError> {
        self.post_json(
            &format!("/api/v1/games/{session_id}/turn"),
            &AdvanceTurnRequest {
                policies: policies.clone(),
            },
        )
        .await
    }

    async fn abandon_session(&self, session_id: &SessionId) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(format!("{}/api/v1/games/{session_id}", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
