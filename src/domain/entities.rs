//! Domain entities - request-side value types with no transport dependencies

use crate::domain::errors::ClientError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
        }
    }
}

/// Top-level key the decoded payload is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKey {
    /// A single document; decoded records collapse to the first one
    Result,
    /// A lazy sequence of hits
    Results,
    /// A lazy sequence of facet records
    Facets,
}

impl ResponseKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKey::Result => "result",
            ResponseKey::Results => "results",
            ResponseKey::Facets => "facets",
        }
    }

    pub fn is_singular(&self) -> bool {
        matches!(self, ResponseKey::Result)
    }
}

/// Static description of how an action travels over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub method: HttpMethod,
    pub streamed: bool,
    pub key: ResponseKey,
}

/// Every operation the remote service exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Search,
    Facets,
    Stats,
    Get,
    Delete,
    Head,
    Post,
    Put,
    Patch,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::Search,
        Action::Facets,
        Action::Stats,
        Action::Get,
        Action::Delete,
        Action::Head,
        Action::Post,
        Action::Put,
        Action::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Search => "search",
            Action::Facets => "facets",
            Action::Stats => "stats",
            Action::Get => "get",
            Action::Delete => "delete",
            Action::Head => "head",
            Action::Post => "post",
            Action::Put => "put",
            Action::Patch => "patch",
        }
    }

    /// The fixed dispatch table entry for this action
    pub fn descriptor(&self) -> ActionDescriptor {
        let (method, streamed, key) = match self {
            Action::Search => (HttpMethod::Get, true, ResponseKey::Results),
            Action::Facets => (HttpMethod::Get, true, ResponseKey::Facets),
            Action::Stats => (HttpMethod::Get, false, ResponseKey::Result),
            Action::Get => (HttpMethod::Get, false, ResponseKey::Result),
            Action::Delete => (HttpMethod::Delete, false, ResponseKey::Result),
            Action::Head => (HttpMethod::Head, false, ResponseKey::Result),
            Action::Post => (HttpMethod::Post, false, ResponseKey::Result),
            Action::Put => (HttpMethod::Put, false, ResponseKey::Result),
            Action::Patch => (HttpMethod::Patch, false, ResponseKey::Result),
        };
        ActionDescriptor { method, streamed, key }
    }

    /// Creation actions address the collection itself, never `_<action>/`
    pub fn is_creation(&self) -> bool {
        matches!(self, Action::Post)
    }

    /// A 404 on these actions means "no such document" rather than a failure
    pub fn is_document_scoped(&self) -> bool {
        matches!(self, Action::Get | Action::Patch | Action::Delete)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // `index` is the historical name of `put`
            "index" => Ok(Action::Put),
            other => Action::ALL
                .iter()
                .copied()
                .find(|action| action.as_str() == other)
                .ok_or_else(|| ClientError::Config(format!("Unknown action: {}", other))),
        }
    }
}

/// One or more index names addressed by a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indexes(Vec<String>);

impl Indexes {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Indexes {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for Indexes {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<&String> for Indexes {
    fn from(name: &String) -> Self {
        Self(vec![name.clone()])
    }
}

impl From<Vec<String>> for Indexes {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for Indexes {
    fn from(names: Vec<&str>) -> Self {
        Self::new(names)
    }
}

impl From<&[&str]> for Indexes {
    fn from(names: &[&str]) -> Self {
        Self::new(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Indexes {
    fn from(names: [&str; N]) -> Self {
        Self::new(names)
    }
}

/// Outgoing request body
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized to JSON text before sending
    Json(serde_json::Value),
    /// Sent as-is, unless it names an existing file, in which case the file is sent
    Text(String),
    /// Already-serialized bytes, sent as-is
    Bytes(Vec<u8>),
    /// Contents of a file on disk
    File(PathBuf),
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<PathBuf> for RequestBody {
    fn from(path: PathBuf) -> Self {
        RequestBody::File(path)
    }
}

/// Request body after resolution, ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingBody {
    Bytes(Vec<u8>),
    /// Streamed from disk by the transport
    File(PathBuf),
}

impl OutgoingBody {
    /// In-memory content, `None` for file bodies
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            OutgoingBody::Bytes(bytes) => Some(bytes),
            OutgoingBody::File(_) => None,
        }
    }
}

/// Fully-resolved request handed to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<OutgoingBody>,
    pub timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_table() {
        let search = Action::Search.descriptor();
        assert_eq!(search.method, HttpMethod::Get);
        assert!(search.streamed);
        assert_eq!(search.key, ResponseKey::Results);

        let facets = Action::Facets.descriptor();
        assert!(facets.streamed);
        assert_eq!(facets.key, ResponseKey::Facets);

        assert_eq!(Action::Delete.descriptor().method, HttpMethod::Delete);
        assert_eq!(Action::Head.descriptor().method, HttpMethod::Head);
        assert_eq!(Action::Post.descriptor().method, HttpMethod::Post);
        assert_eq!(Action::Put.descriptor().method, HttpMethod::Put);
        assert_eq!(Action::Patch.descriptor().method, HttpMethod::Patch);

        for action in [Action::Stats, Action::Get, Action::Delete, Action::Head, Action::Post, Action::Put, Action::Patch] {
            let descriptor = action.descriptor();
            assert!(!descriptor.streamed, "{} should not stream", action);
            assert!(descriptor.key.is_singular());
        }
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("search".parse::<Action>().unwrap(), Action::Search);
        assert_eq!("index".parse::<Action>().unwrap(), Action::Put);
        assert_eq!("patch".parse::<Action>().unwrap(), Action::Patch);
        assert!("merge".parse::<Action>().is_err());
    }

    #[test]
    fn test_document_scoped_actions() {
        let scoped: Vec<_> = Action::ALL.iter().filter(|a| a.is_document_scoped()).collect();
        assert_eq!(scoped, vec![&Action::Get, &Action::Delete, &Action::Patch]);
    }

    #[test]
    fn test_indexes_conversions() {
        let single: Indexes = "books".into();
        assert_eq!(single.iter().collect::<Vec<_>>(), vec!["books"]);

        let many: Indexes = ["books", "films"].into();
        assert_eq!(many.iter().collect::<Vec<_>>(), vec!["books", "films"]);
    }
}
