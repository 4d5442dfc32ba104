use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::{ResultExt, ensure};

use super::contract::{ChatReply, ChatTurnRequest, LearnReply, LearnSubmission};
use super::error::{
    BackendResult, InvalidEndpointSnafu, MalformedReplySnafu, RequestFailedSnafu,
    UnexpectedStatusSnafu,
};

pub use futures::future::BoxFuture;

/// Transport boundary for the bot service.
///
/// The widget only ever issues two calls: one chat turn, one teach-back
/// submission. Implementations are object-safe so tests can substitute a
/// scripted backend.
pub trait ChatBackend: Send + Sync {
    /// Sends one user message and resolves with the service's reply.
    fn send_chat<'a>(&'a self, request: ChatTurnRequest) -> BoxFuture<'a, BackendResult<ChatReply>>;

    /// Submits an operator-provided answer for a question the service
    /// flagged as unanswered.
    fn submit_learning<'a>(
        &'a self,
        submission: LearnSubmission,
    ) -> BoxFuture<'a, BackendResult<LearnReply>>;
}

/// Connection settings for one `HttpBackend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub endpoint: String,
}

impl BackendConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

/// `ChatBackend` over plain HTTP/JSON.
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        ensure!(
            !endpoint.is_empty(),
            InvalidEndpointSnafu {
                stage: "http-backend-new",
                endpoint: config.endpoint.clone(),
            }
        );

        let client = reqwest::Client::builder()
            .build()
            .context(RequestFailedSnafu {
                stage: "build-client",
            })?;

        Ok(Self { client, endpoint })
    }

    async fn post_json<B, R>(&self, path: &'static str, body: &B) -> BackendResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context(RequestFailedSnafu { stage: path })?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .context(RequestFailedSnafu { stage: path })?;

        if !status.is_success() {
            tracing::warn!(
                url = %url,
                status = status.as_u16(),
                "bot service rejected the request"
            );
            return UnexpectedStatusSnafu {
                stage: path,
                status: status.as_u16(),
                body: payload,
            }
            .fail();
        }

        serde_json::from_str(&payload).context(MalformedReplySnafu {
            stage: path,
            body: payload.clone(),
        })
    }
}

impl ChatBackend for HttpBackend {
    fn send_chat<'a>(&'a self, request: ChatTurnRequest) -> BoxFuture<'a, BackendResult<ChatReply>> {
        Box::pin(async move { self.post_json("/chat", &request).await })
    }

    fn submit_learning<'a>(
        &'a self,
        submission: LearnSubmission,
    ) -> BoxFuture<'a, BackendResult<LearnReply>> {
        Box::pin(async move { self.post_json("/learn", &submission).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;

    #[test]
    fn endpoint_is_normalized_without_trailing_slash() {
        let backend = HttpBackend::new(BackendConfig::new("http://127.0.0.1:5000/")).unwrap();
        assert_eq!(backend.endpoint, "http://127.0.0.1:5000");
    }

    #[test]
    fn blank_endpoint_is_rejected() {
        let error = HttpBackend::new(BackendConfig::new("   ")).unwrap_err();
        assert!(matches!(error, BackendError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn unreachable_service_surfaces_a_network_error() {
        // Port 0 is never routable, so the send fails before any payload handling.
        let backend = HttpBackend::new(BackendConfig::new("http://127.0.0.1:0")).unwrap();
        let error = backend
            .send_chat(ChatTurnRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(error.is_network());
    }
}
