//! Purpose: Issue single GET requests against the dataset query service.
//! Exports: `PageFetcher`, `HttpFetcher`, `Query`, `Endpoint`.
//! Role: The only network seam; streams and the client depend on the trait.
//! Invariants: One attempt per call; no retries and no caching.
//! Invariants: Non-2xx responses become `Transport` errors carrying url, status, status text.
//! Invariants: The bearer token is sent as a header and never appears in urls or logs.
use super::ApiResult;
use super::config::ClientConfig;
use crate::core::cursor::StreamCursor;
use crate::core::error::{Error, ErrorKind};
use crate::core::request::DatasetSource;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endpoint {
    IsValid,
    Splits,
    Info,
    Parquet,
    Rows,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::IsValid => "is-valid",
            Endpoint::Splits => "splits",
            Endpoint::Info => "info",
            Endpoint::Parquet => "parquet",
            Endpoint::Rows => "rows",
        }
    }
}

/// One request: an endpoint plus its ordered query parameters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    endpoint: Endpoint,
    params: Vec<(&'static str, String)>,
}

impl Query {
    pub fn new(endpoint: Endpoint, source: &DatasetSource) -> Self {
        Self {
            endpoint,
            params: vec![("dataset", source.id().to_string())],
        }
    }

    pub fn rows(source: &DatasetSource, split: &str, config: &str, cursor: StreamCursor) -> Self {
        Self::new(Endpoint::Rows, source)
            .with_param("config", config)
            .with_param("split", split)
            .with_param("offset", cursor.offset())
            .with_param("length", cursor.length())
    }

    pub fn with_param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}

pub trait PageFetcher: Send + Sync {
    /// Resolves to the untyped JSON body of a successful response.
    fn fetch(&self, query: Query) -> BoxFuture<'_, ApiResult<Value>>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    inner: Arc<HttpFetcherInner>,
}

struct HttpFetcherInner {
    base_url: Url,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            inner: Arc::new(HttpFetcherInner {
                base_url,
                token: config.token.clone(),
                agent: builder.build(),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn url_for(&self, query: &Query) -> ApiResult<Url> {
        build_url(&self.inner.base_url, query)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, query: Query) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(async move {
            let url = self.url_for(&query)?;
            debug!(url = %url, "issuing request");
            let inner = Arc::clone(&self.inner);
            tokio::task::spawn_blocking(move || inner.get_json(&url))
                .await
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("fetch worker did not complete")
                        .with_source(err)
                })?
        })
    }
}

impl HttpFetcherInner {
    fn get_json(&self, url: &Url) -> ApiResult<Value> {
        let mut request = self
            .agent
            .get(url.as_str())
            .set("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }

        match request.call() {
            Ok(response) => read_json_response(url, response),
            Err(ureq::Error::Status(code, response)) => {
                warn!(url = %url, status = code, "request rejected");
                Err(Error::new(ErrorKind::Transport)
                    .with_message(format!("error fetching data: {}", response.status_text()))
                    .with_status(code)
                    .with_url(url.as_str())
                    .with_hint(status_hint(code)))
            }
            Err(ureq::Error::Transport(err)) => {
                warn!(url = %url, error = %err, "request failed");
                Err(Error::new(ErrorKind::Transport)
                    .with_message("request failed")
                    .with_url(url.as_str())
                    .with_source(err))
            }
        }
    }
}

fn read_json_response(url: &Url, response: ureq::Response) -> ApiResult<Value> {
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Transport)
            .with_message("failed to read response body")
            .with_url(url.as_str())
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Transport)
            .with_message("invalid response json")
            .with_url(url.as_str())
            .with_source(err)
    })
}

fn status_hint(status: u16) -> &'static str {
    match status {
        401 | 403 => "check the access token; gated datasets require one",
        404 => "check the dataset id, config, and split names",
        429 => "the service is rate limiting requests; try again later",
        500..=599 => "the dataset service failed; the dataset may still be processing",
        _ => "the dataset service rejected the request",
    }
}

fn normalize_base_url(raw: &str) -> ApiResult<Url> {
    let mut url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage).with_message("base url must use http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(Error::new(ErrorKind::Usage).with_message("base url cannot be a base"));
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, query: &Query) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| Error::new(ErrorKind::Usage).with_message("base url cannot be a base"))?;
        path.pop_if_empty();
        path.push(query.endpoint().path());
    }
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query.params() {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}
