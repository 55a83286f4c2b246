/// Use Cases - the single request path every action goes through
/// Uses domain entities and the transport port

use crate::adapters::stream::StreamDecoder;
use crate::domain::{
    read_to_end, Action, BufferedRecords, ClientError, HttpRequest, Metadata, OutgoingBody,
    ParamValue, Payload, QueryParams, RecordSource, RequestBody, Response, Results, Transport,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Per-call transport options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Extra query parameters, merged over the action's own
    pub params: QueryParams,
    pub headers: Vec<(String, String)>,
    /// Overrides the action's default streaming mode
    pub stream: Option<bool>,
    pub timeout: Option<Duration>,
    /// Per-call host, optionally `host:port`
    pub host: Option<String>,
    pub port: Option<u16>,
    pub nodename: Option<String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn nodename(mut self, nodename: impl Into<String>) -> Self {
        self.nodename = Some(nodename.into());
        self
    }
}

/// Turn a request body into what the transport sends
pub async fn resolve_body(body: RequestBody) -> Result<OutgoingBody, ClientError> {
    match body {
        RequestBody::Json(value) => Ok(OutgoingBody::Bytes(serde_json::to_vec(&value)?)),
        RequestBody::Bytes(bytes) => Ok(OutgoingBody::Bytes(bytes)),
        RequestBody::File(path) => file_body(path).await,
        RequestBody::Text(text) => {
            if Path::new(&text).is_file() {
                file_body(PathBuf::from(text)).await
            } else {
                Ok(OutgoingBody::Bytes(text.into_bytes()))
            }
        }
    }
}

async fn file_body(path: PathBuf) -> Result<OutgoingBody, ClientError> {
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| ClientError::Body(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(ClientError::Body(format!("{}: not a file", path.display())));
    }
    tracing::debug!("Streaming file body: {} ({} bytes)", path.display(), metadata.len());
    Ok(OutgoingBody::File(path))
}

/// Issues requests through a transport and shapes the responses
pub struct RequestDispatcher<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> Clone for RequestDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl<T: Transport> RequestDispatcher<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Perform one request for `action` against an already-built `url`.
    ///
    /// `default` is returned in place of a `NotFound` error when a
    /// document-scoped action gets a 404.
    pub async fn send_request(
        &self,
        action: Action,
        url: String,
        body: Option<RequestBody>,
        options: &RequestOptions,
        default: Option<Value>,
    ) -> Result<Response, ClientError> {
        let descriptor = action.descriptor();
        let stream = options.stream.unwrap_or(descriptor.streamed);

        let body = match body {
            Some(body) => Some(resolve_body(body).await?),
            None => None,
        };

        let request = HttpRequest {
            method: descriptor.method,
            url: url.clone(),
            query: options.params.to_pairs(),
            headers: options.headers.clone(),
            body,
            timeout: options.timeout,
        };

        tracing::debug!(
            "{} {} ({} params, stream={})",
            request.method.as_str(),
            url,
            request.query.len(),
            stream
        );

        let mut response = self.transport.send(request).await?;
        let status = response.status_code;

        tracing::debug!("{} {} -> {}", descriptor.method.as_str(), url, status);

        if status == 404 && action.is_document_scoped() {
            return match default {
                Some(value) => {
                    tracing::warn!("{} not found, returning caller default", url);
                    Ok(Response::from_default(value))
                }
                None => Err(ClientError::NotFound { action, url }),
            };
        }
        if !(200..300).contains(&status) {
            return Err(ClientError::Http { status, url });
        }

        let metadata = Metadata::from_headers(&response.headers);
        let is_json = metadata
            .content_type()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        let mut results = if stream {
            let mut decoder = StreamDecoder::new(response.body, is_json);
            let meta = match decoder.next_record().await {
                Some(record) => record?,
                None => Value::Null,
            };
            Results::new(meta, metadata.clone(), Box::new(decoder))
        } else {
            let content = read_to_end(response.body.as_mut()).await?;
            let record = if content.is_empty() {
                None
            } else if is_json {
                Some(serde_json::from_slice::<Value>(&content)?)
            } else if descriptor.key.is_singular() {
                let payload = Payload::Raw(content);
                return Ok(Response::new(descriptor.key, status, payload, metadata));
            } else {
                Some(Value::String(String::from_utf8_lossy(&content).into_owned()))
            };
            Results::new(Value::Null, metadata.clone(), Box::new(BufferedRecords::new(record)))
        };

        let payload = if descriptor.key.is_singular() {
            match results.next().await {
                Some(document) => Payload::Result(document?),
                None => Payload::Empty,
            }
        } else {
            Payload::Results(results)
        };

        Ok(Response::new(descriptor.key, status, payload, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HttpResponse, MemoryBody};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Transport double that records requests and replays a canned response
    struct CannedTransport {
        status: u16,
        headers: Vec<(String, String)>,
        chunks: Vec<String>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn json(status: u16, chunks: Vec<&str>) -> Self {
            Self {
                status,
                headers: vec![("Content-Type".to_string(), "application/json; charset=UTF-8".to_string())],
                chunks: chunks.into_iter().map(String::from).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse {
                status_code: self.status,
                headers: self.headers.clone(),
                body: Box::new(MemoryBody::new(self.chunks.clone())),
            })
        }
    }

    fn dispatcher(transport: CannedTransport) -> RequestDispatcher<CannedTransport> {
        RequestDispatcher::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_not_found_without_default() {
        for action in [Action::Get, Action::Patch, Action::Delete] {
            let d = dispatcher(CannedTransport::json(404, vec![]));
            let err = d
                .send_request(action, "http://h:1/i/1".into(), None, &RequestOptions::new(), None)
                .await
                .unwrap_err();
            assert!(err.is_not_found(), "{} should map 404 to NotFound", action);
        }
    }

    #[tokio::test]
    async fn test_not_found_with_default() {
        let d = dispatcher(CannedTransport::json(404, vec![]));
        let response = d
            .send_request(
                Action::Get,
                "http://h:1/i/1".into(),
                None,
                &RequestOptions::new(),
                Some(json!({"missing": true})),
            )
            .await
            .unwrap();
        assert_eq!(response.into_document().unwrap().into_value(), json!({"missing": true}));
    }

    #[tokio::test]
    async fn test_404_on_other_actions_is_http_error() {
        let d = dispatcher(CannedTransport::json(404, vec![]));
        let err = d
            .send_request(Action::Search, "http://h:1/i/_search/".into(), None, &RequestOptions::new(), Some(json!(1)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_non_success_status_carries_code() {
        for status in [400u16, 409, 500, 503] {
            let d = dispatcher(CannedTransport::json(status, vec!["{}"]));
            let err = d
                .send_request(Action::Put, "http://h:1/i/1".into(), None, &RequestOptions::new(), None)
                .await
                .unwrap_err();
            assert!(matches!(err, ClientError::Http { status: s, .. } if s == status));
        }
    }

    #[tokio::test]
    async fn test_request_is_built_from_options() {
        let transport = Arc::new(CannedTransport::json(200, vec!["{\"_id\":1}"]));
        let d = RequestDispatcher::new(transport.clone());
        let options = RequestOptions::new()
            .param("pretty", false)
            .param("schema__type", "object")
            .header("X-Trace", "1")
            .timeout(Duration::from_secs(3));
        d.send_request(
            Action::Put,
            "http://h:1/i/1".into(),
            Some(json!({"title": "Dune"}).into()),
            &options,
            None,
        )
        .await
        .unwrap();

        let seen = transport.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.method, crate::domain::HttpMethod::Put);
        assert_eq!(
            request.query,
            vec![
                ("pretty".to_string(), "0".to_string()),
                ("schema.type".to_string(), "object".to_string()),
            ]
        );
        assert_eq!(request.headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert_eq!(
            request.body.as_ref().and_then(OutgoingBody::as_bytes),
            Some(&b"{\"title\":\"Dune\"}"[..])
        );
        assert_eq!(request.timeout, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn test_streamed_results_consume_meta_record() {
        let d = dispatcher(CannedTransport::json(
            200,
            vec![
                "{\"_aggregations\":{},\"_query\":{\"_total_count\":1,\"_hits\":[\n\n",
                "{\"_id\":\"a\"}\n\n]}}",
            ],
        ));
        let response = d
            .send_request(Action::Search, "http://h:1/i/_search/".into(), None, &RequestOptions::new(), None)
            .await
            .unwrap();
        let results = response.into_results().unwrap();
        assert_eq!(results.len(), 1);
        let docs = results.try_collect().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), Some(&json!("a")));
    }

    #[tokio::test]
    async fn test_stream_override_collapses_singular_key() {
        let d = dispatcher(CannedTransport::json(200, vec!["{\"meta\":1}\n\n{\"_id\":5}\n\n{\"_id\":6}"]));
        let response = d
            .send_request(
                Action::Get,
                "http://h:1/i/5".into(),
                None,
                &RequestOptions::new().stream(true),
                None,
            )
            .await
            .unwrap();
        assert_eq!(response.document().unwrap().id(), Some(&json!(5)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_raw() {
        let mut transport = CannedTransport::json(200, vec!["plain ", "bytes"]);
        transport.headers = vec![("content-type".to_string(), "text/plain".to_string())];
        let response = dispatcher(transport)
            .send_request(Action::Get, "http://h:1/i/1".into(), None, &RequestOptions::new(), None)
            .await
            .unwrap();
        assert_eq!(response.raw(), Some(&b"plain bytes"[..]));
    }

    #[tokio::test]
    async fn test_empty_body_is_empty_payload() {
        let response = dispatcher(CannedTransport::json(200, vec![]))
            .send_request(Action::Head, "http://h:1/i/1".into(), None, &RequestOptions::new(), None)
            .await
            .unwrap();
        assert!(matches!(response.payload(), Payload::Empty));
    }

    #[tokio::test]
    async fn test_text_body_naming_a_file_sends_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"{\"from\":\"file\"}").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        assert_eq!(
            resolve_body(RequestBody::Text(path)).await.unwrap(),
            OutgoingBody::File(file.path().to_path_buf())
        );
        assert_eq!(
            resolve_body(RequestBody::Text("{\"inline\":1}".into())).await.unwrap(),
            OutgoingBody::Bytes(b"{\"inline\":1}".to_vec())
        );
        assert!(matches!(
            resolve_body(RequestBody::File("/nonexistent/body.json".into())).await,
            Err(ClientError::Body(_))
        ));
        let dir = tempfile::TempDir::new().unwrap();
        assert!(resolve_body(RequestBody::File(dir.path().to_path_buf())).await.is_err());
    }
}
