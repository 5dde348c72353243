use crate::config::BackendConfig;
use crate::events::{BotReply, SourceDocument};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failure of a single backend round-trip
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Connection, TLS or I/O failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-2xx response
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Body could not be decoded into an answer
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Question-answering backend reachable over one request/response call
#[async_trait]
pub trait Backend: Send + Sync {
    async fn ask(&self, question: &str) -> Result<BotReply, BackendError>;
}

/// Request body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Response body of `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub source_documents: Vec<WireDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireDocument {
    pub metadata: WireMetadata,
    pub page_content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMetadata {
    pub source: String,
}

impl From<ChatResponse> for BotReply {
    fn from(response: ChatResponse) -> Self {
        BotReply {
            answer: response.answer,
            source_documents: response
                .source_documents
                .into_iter()
                .map(|doc| SourceDocument::new(doc.metadata.source, doc.page_content))
                .collect(),
        }
    }
}

/// Decode a raw response body
pub fn decode_reply(body: &[u8]) -> Result<BotReply, BackendError> {
    let response: ChatResponse = serde_json::from_slice(body)?;
    Ok(response.into())
}

/// HTTP client for the chat backend
#[derive(Clone)]
pub struct HttpBackend {
    url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Self {
        // No timeout: a turn stays pending until the backend answers or the connection drops.
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &BackendConfig, client: reqwest::Client) -> Self {
        Self {
            url: config.chat_url(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn ask(&self, question: &str) -> Result<BotReply, BackendError> {
        let payload = ChatRequest {
            question: question.to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await?;
        decode_reply(&body)
    }
}
