//! High-level client: one method per remote action
//!
//! Each method folds its named options into query parameters and hands the
//! request to the dispatcher. Unset options are omitted from the query string;
//! `pretty` (and `volatile` on reads) are always sent.

use crate::config::ClientConfig;
use crate::domain::{
    Action, ClientError, Indexes, ParamValue, QueryParams, RequestBody, Response, Transport,
    UrlBuilder,
};
use crate::infrastructure::ReqwestTransport;
use crate::use_cases::{RequestDispatcher, RequestOptions};
use serde_json::Value;
use std::sync::Arc;

/// Options for `search` and `facets`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub partial: Option<ParamValue>,
    pub terms: Option<String>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub sort: Option<String>,
    pub facets: Option<String>,
    pub language: Option<String>,
    pub pretty: bool,
    pub volatile: bool,
    pub request: RequestOptions,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn partial(mut self, partial: impl Into<ParamValue>) -> Self {
        self.partial = Some(partial.into());
        self
    }

    pub fn terms(mut self, terms: impl Into<String>) -> Self {
        self.terms = Some(terms.into());
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn facets(mut self, facets: impl Into<String>) -> Self {
        self.facets = Some(facets.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn volatile(mut self, volatile: bool) -> Self {
        self.volatile = volatile;
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new()
            .with("pretty", self.pretty)
            .with("volatile", self.volatile);
        params.insert_opt("query", self.query.clone());
        params.insert_opt("partial", self.partial.clone());
        params.insert_opt("terms", self.terms.clone());
        params.insert_opt("offset", self.offset);
        params.insert_opt("limit", self.limit);
        params.insert_opt("sort", self.sort.clone());
        params.insert_opt("facets", self.facets.clone());
        params.insert_opt("language", self.language.clone());
        params
    }
}

/// Options for `get`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    pub pretty: bool,
    /// Accept a possibly stale, faster read
    pub volatile: bool,
    pub request: RequestOptions,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn volatile(mut self, volatile: bool) -> Self {
        self.volatile = volatile;
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .with("pretty", self.pretty)
            .with("volatile", self.volatile)
    }
}

/// Options for `stats` and `head`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaOptions {
    pub pretty: bool,
    pub request: RequestOptions,
}

impl MetaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    pub fn to_params(&self) -> QueryParams {
        QueryParams::new().with("pretty", self.pretty)
    }
}

/// Options for `delete`, `post`, `put`/`index` and `patch`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    /// Overrides the client's commit default
    pub commit: Option<bool>,
    pub pretty: bool,
    pub request: RequestOptions,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(mut self, commit: bool) -> Self {
        self.commit = Some(commit);
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    pub fn to_params(&self, default_commit: bool) -> QueryParams {
        QueryParams::new()
            .with("commit", self.commit.unwrap_or(default_commit))
            .with("pretty", self.pretty)
    }
}

/// Fold an action's own parameters under the caller's extra ones
fn merge(own: QueryParams, mut request: RequestOptions) -> RequestOptions {
    let mut params = own;
    params.extend(&request.params);
    request.params = params;
    request
}

/// Client for one search service endpoint and namespace.
///
/// Cheap to clone; clones share the underlying connection pool.
pub struct XapiandClient<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    urls: UrlBuilder,
    dispatcher: RequestDispatcher<T>,
}

impl<T: Transport> Clone for XapiandClient<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            urls: self.urls.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl XapiandClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config.pool_size, config.timeout)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client for the `live` namespace on the default endpoint
    pub fn live() -> Result<Self, ClientError> {
        Self::new(ClientConfig::live())
    }

    /// Client for the `sandbox` namespace on the default endpoint
    pub fn sandbox() -> Result<Self, ClientError> {
        Self::new(ClientConfig::sandbox())
    }
}

impl<T: Transport> XapiandClient<T> {
    pub fn with_transport(config: ClientConfig, transport: Arc<T>) -> Result<Self, ClientError> {
        let urls = UrlBuilder::new(&config.host, config.port, config.prefix.clone())?;

        tracing::info!(
            "Created client for {}:{} (prefix: {})",
            urls.host(),
            urls.port(),
            urls.prefix().unwrap_or("-")
        );

        Ok(Self {
            config,
            urls,
            dispatcher: RequestDispatcher::new(transport),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn url_builder(&self) -> &UrlBuilder {
        &self.urls
    }

    /// URL a request would be sent to, honoring per-call host/port/nodename
    pub fn build_url(
        &self,
        action: Action,
        indexes: &Indexes,
        id: Option<&str>,
        options: &RequestOptions,
    ) -> Result<String, ClientError> {
        self.urls.build(
            action,
            indexes,
            options.host.as_deref(),
            options.port,
            options.nodename.as_deref(),
            id,
        )
    }

    /// Generic entry point behind every action method
    pub async fn send_request(
        &self,
        action: Action,
        indexes: impl Into<Indexes>,
        id: Option<&str>,
        body: Option<RequestBody>,
        options: RequestOptions,
        default: Option<Value>,
    ) -> Result<Response, ClientError> {
        let url = self.build_url(action, &indexes.into(), id, &options)?;
        self.dispatcher
            .send_request(action, url, body, &options, default)
            .await
    }

    pub async fn search(
        &self,
        indexes: impl Into<Indexes>,
        opts: SearchOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(), opts.request);
        self.send_request(Action::Search, indexes, None, None, options, None)
            .await
    }

    pub async fn facets(
        &self,
        indexes: impl Into<Indexes>,
        opts: SearchOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(), opts.request);
        self.send_request(Action::Facets, indexes, None, None, options, None)
            .await
    }

    pub async fn stats(
        &self,
        indexes: impl Into<Indexes>,
        opts: MetaOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(), opts.request);
        self.send_request(Action::Stats, indexes, None, None, options, None)
            .await
    }

    pub async fn head(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        opts: MetaOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(), opts.request);
        self.send_request(Action::Head, indexes, Some(id), None, options, None)
            .await
    }

    /// Fails with `ClientError::NotFound` when the document does not exist
    pub async fn get(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        opts: ReadOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(), opts.request);
        self.send_request(Action::Get, indexes, Some(id), None, options, None)
            .await
    }

    /// Like `get`, but a missing document yields `default` instead of an error
    pub async fn get_or(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        default: Value,
        opts: ReadOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(), opts.request);
        self.send_request(Action::Get, indexes, Some(id), None, options, Some(default))
            .await
    }

    pub async fn delete(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        opts: WriteOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(self.config.commit), opts.request);
        self.send_request(Action::Delete, indexes, Some(id), None, options, None)
            .await
    }

    pub async fn delete_or(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        default: Value,
        opts: WriteOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(self.config.commit), opts.request);
        self.send_request(Action::Delete, indexes, Some(id), None, options, Some(default))
            .await
    }

    /// Create a document and let the server assign its id
    pub async fn post(
        &self,
        indexes: impl Into<Indexes>,
        body: impl Into<RequestBody>,
        opts: WriteOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(self.config.commit), opts.request);
        self.send_request(Action::Post, indexes, None, Some(body.into()), options, None)
            .await
    }

    /// Create or replace the document stored under `id`
    pub async fn put(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        body: impl Into<RequestBody>,
        opts: WriteOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(self.config.commit), opts.request);
        self.send_request(Action::Put, indexes, Some(id), Some(body.into()), options, None)
            .await
    }

    /// Alias of `put`
    pub async fn index(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        body: impl Into<RequestBody>,
        opts: WriteOptions,
    ) -> Result<Response, ClientError> {
        self.put(indexes, id, body, opts).await
    }

    pub async fn patch(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        body: impl Into<RequestBody>,
        opts: WriteOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(self.config.commit), opts.request);
        self.send_request(Action::Patch, indexes, Some(id), Some(body.into()), options, None)
            .await
    }

    pub async fn patch_or(
        &self,
        indexes: impl Into<Indexes>,
        id: &str,
        body: impl Into<RequestBody>,
        default: Value,
        opts: WriteOptions,
    ) -> Result<Response, ClientError> {
        let options = merge(opts.to_params(self.config.commit), opts.request);
        self.send_request(
            Action::Patch,
            indexes,
            Some(id),
            Some(body.into()),
            options,
            Some(default),
        )
        .await
    }
}
