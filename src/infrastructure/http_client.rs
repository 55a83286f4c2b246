/// HTTP transport adapter
/// Implements Transport on top of a pooled reqwest client

use crate::domain::repositories::{BodyChunks, HttpResponse, Transport};
use crate::domain::{ClientError, HttpMethod, HttpRequest, OutgoingBody};
use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// Idle connections kept per host
pub const DEFAULT_POOL_SIZE: usize = 100;

/// Read size when streaming a file body
const FILE_CHUNK_SIZE: usize = 64 * 1024;

fn map_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(e.to_string())
    } else {
        ClientError::Transport(e.to_string())
    }
}

fn to_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Head => reqwest::Method::HEAD,
    }
}

/// Chunks of an open file, ending at EOF
fn file_chunks(file: tokio::fs::File) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send + 'static {
    stream::try_unfold(file, |mut file| async move {
        let mut chunk = vec![0u8; FILE_CHUNK_SIZE];
        let read = file.read(&mut chunk).await?;
        if read == 0 {
            return Ok(None);
        }
        chunk.truncate(read);
        Ok(Some((chunk, file)))
    })
}

async fn file_body(path: &Path) -> Result<reqwest::Body, ClientError> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ClientError::Body(format!("{}: {}", path.display(), e)))?;
    Ok(reqwest::Body::wrap_stream(file_chunks(file)))
}

/// Implementation using a shared reqwest connection pool
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// `timeout` applies to every request; `None` means no timeout
    pub fn new(pool_size: usize, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(pool_size);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Response body read chunk by chunk off the connection
struct ReqwestBody(reqwest::Response);

#[async_trait]
impl BodyChunks for ReqwestBody {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        let chunk = self.0.chunk().await.map_err(map_error)?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut builder = self
            .client
            .request(to_method(request.method), &request.url)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match request.body {
            Some(OutgoingBody::Bytes(bytes)) => builder = builder.body(bytes),
            Some(OutgoingBody::File(path)) => builder = builder.body(file_body(&path).await?),
            None => {}
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(map_error)?;

        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_string(), v.to_string()))
            })
            .collect();

        Ok(HttpResponse {
            status_code: response.status().as_u16(),
            headers,
            body: Box::new(ReqwestBody(response)),
        })
    }
}
