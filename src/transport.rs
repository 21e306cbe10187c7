use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use crate::error::TransportError;

/// How a delivered request's response is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsePolicy {
    /// The response is not consulted. Any completed exchange counts as
    /// delivered, including 4xx/5xx replies.
    #[default]
    Opaque,
    /// Non-2xx replies are failures.
    Strict,
}

/// Sends one serialized entry to the endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, endpoint: &Url, body: String) -> Result<(), TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    policy: ResponsePolicy,
}

impl HttpTransport {
    pub fn new(policy: ResponsePolicy) -> Self {
        Self::with_client(reqwest::Client::new(), policy)
    }

    pub fn with_client(client: reqwest::Client, policy: ResponsePolicy) -> Self {
        HttpTransport { client, policy }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, endpoint: &Url, body: String) -> Result<(), TransportError> {
        tracing::info!(url = %endpoint, bytes = body.len(), "Posting guestbook entry");

        let response = self
            .client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), policy = ?self.policy, "Endpoint responded");

        match self.policy {
            ResponsePolicy::Opaque => Ok(()),
            ResponsePolicy::Strict if status.is_success() => Ok(()),
            ResponsePolicy::Strict => Err(TransportError::Rejected {
                status: status.as_u16(),
            }),
        }
    }
}
