//! Purpose: Bind a dataset id, a row shape, and an optional remap into one client.
//! Exports: `DatasetClient`.
//! Role: Entry point for metadata lookups, single-page reads, and row streams.
//! Invariants: Source and transform are fixed once built; every stream gets its own cursor.
//! Invariants: Metadata payloads are shape-checked before they are returned.
use super::ApiResult;
use super::config::ClientConfig;
use super::fetch::{Endpoint, HttpFetcher, PageFetcher, Query};
use super::metadata::{DatasetInfo, ParquetFiles, Splits, Validity};
use super::stream::RowStream;
use crate::core::cursor::StreamCursor;
use crate::core::decode::decode_page;
use crate::core::error::ValidationStage;
use crate::core::page::Page;
use crate::core::request::{DEFAULT_PAGE_LENGTH, DatasetSource, PageRequest};
use crate::core::schema::conform;
use crate::core::transform::Transform;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "default";

pub struct DatasetClient<T> {
    source: DatasetSource,
    fetcher: Arc<dyn PageFetcher>,
    transform: Transform,
    default_length: u64,
    _row: PhantomData<fn() -> T>,
}

impl<T> DatasetClient<T>
where
    T: DeserializeOwned,
{
    /// Builds a client that talks HTTP to `config.base_url`.
    pub fn new(dataset: impl Into<DatasetSource>, config: ClientConfig) -> ApiResult<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(dataset, Arc::new(fetcher)).with_default_length(config.default_length))
    }

    pub fn with_fetcher(dataset: impl Into<DatasetSource>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            source: dataset.into(),
            fetcher,
            transform: Transform::Identity,
            default_length: DEFAULT_PAGE_LENGTH,
            _row: PhantomData,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_default_length(mut self, length: u64) -> Self {
        self.default_length = length;
        self
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub async fn is_valid(&self) -> ApiResult<Validity> {
        self.metadata(Query::new(Endpoint::IsValid, &self.source))
            .await
    }

    pub async fn splits(&self) -> ApiResult<Splits> {
        self.metadata(Query::new(Endpoint::Splits, &self.source))
            .await
    }

    /// Dataset card metadata for `config` (`"default"` when omitted).
    pub async fn info(&self, config: Option<&str>) -> ApiResult<DatasetInfo> {
        let query = Query::new(Endpoint::Info, &self.source)
            .with_param("config", config.unwrap_or(DEFAULT_CONFIG));
        self.metadata(query).await
    }

    pub async fn parquet_files(&self) -> ApiResult<ParquetFiles> {
        let files: ParquetFiles = self
            .metadata(Query::new(Endpoint::Parquet, &self.source))
            .await?;
        files.check_sizes()
    }

    /// Reads exactly one page without creating a stream.
    pub async fn rows(&self, request: &PageRequest) -> ApiResult<Page<T>> {
        let cursor = self.cursor_for(request)?;
        let query = Query::rows(&self.source, &request.split, &request.config, cursor);
        let raw = self.fetcher.fetch(query).await?;
        decode_page(raw, &self.transform)
    }

    /// Starts a fresh stream at `request.offset` (default 0).
    pub fn stream(&self, request: PageRequest) -> ApiResult<RowStream<T>> {
        let cursor = self.cursor_for(&request)?;
        Ok(RowStream::new(
            self.source.clone(),
            request.split,
            request.config,
            cursor,
            Arc::clone(&self.fetcher),
            self.transform.clone(),
        ))
    }

    async fn metadata<M>(&self, query: Query) -> ApiResult<M>
    where
        M: DeserializeOwned,
    {
        let raw = self.fetcher.fetch(query).await?;
        conform(raw, "$").map_err(|v| v.into_error(ValidationStage::Envelope))
    }

    fn cursor_for(&self, request: &PageRequest) -> ApiResult<StreamCursor> {
        StreamCursor::new(
            request.offset.unwrap_or(0),
            request.length.unwrap_or(self.default_length),
        )
    }
}

impl<T> Clone for DatasetClient<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            fetcher: Arc::clone(&self.fetcher),
            transform: self.transform.clone(),
            default_length: self.default_length,
            _row: PhantomData,
        }
    }
}

impl<T> fmt::Debug for DatasetClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetClient")
            .field("source", &self.source)
            .field("transform", &self.transform)
            .field("default_length", &self.default_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::DatasetClient;
    use crate::api::config::ClientConfig;
    use crate::core::error::ErrorKind;
    use crate::core::request::PageRequest;
    use serde_json::Value;

    #[test]
    fn stream_rejects_zero_length() {
        let client: DatasetClient<Value> =
            DatasetClient::new("rajpurkar/squad", ClientConfig::new()).expect("client");
        let err = client
            .stream(PageRequest::new("train", "plain_text").with_length(0))
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn stream_uses_configured_default_length() {
        let client: DatasetClient<Value> = DatasetClient::new(
            "rajpurkar/squad",
            ClientConfig::new().with_default_length(25),
        )
        .expect("client");
        let rows = client
            .stream(PageRequest::new("train", "plain_text").with_offset(50))
            .expect("stream");
        assert_eq!(rows.cursor().offset(), 50);
        assert_eq!(rows.cursor().length(), 25);
    }
}
