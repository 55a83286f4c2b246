/// Ports - contracts the dispatcher depends on, implemented in outer layers

use crate::domain::entities::HttpRequest;
use crate::domain::errors::ClientError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;

/// Pull-based access to a response body, one network chunk at a time
#[async_trait]
pub trait BodyChunks: Send {
    /// Next chunk of the body, or `None` once the body is exhausted
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ClientError>;
}

/// Response as seen by the dispatcher; the body has not been read yet
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn BodyChunks>,
}

impl HttpResponse {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status_code", &self.status_code)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Service for issuing one HTTP request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return as soon as the status line and headers arrive
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// Source of decoded records behind a result set
#[async_trait]
pub trait RecordSource: Send {
    /// Next decoded record; `None` once the source is exhausted, and forever after
    async fn next_record(&mut self) -> Option<Result<Value, ClientError>>;
}

/// In-memory body, mostly useful for transports that buffer and for tests
#[derive(Debug, Default)]
pub struct MemoryBody {
    chunks: VecDeque<Vec<u8>>,
}

impl MemoryBody {
    pub fn new(chunks: impl IntoIterator<Item = impl Into<Vec<u8>>>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl BodyChunks for MemoryBody {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.chunks.pop_front())
    }
}

/// Drain a body into one buffer
pub async fn read_to_end(body: &mut dyn BodyChunks) -> Result<Vec<u8>, ClientError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = body.next_chunk().await? {
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer)
}
