//! Purpose: Pull successive row pages from one dataset split.
//! Exports: `RowStream`.
//! Role: Lazy, caller-driven pager; nothing is fetched until `next_page` is awaited.
//! Invariants: The cursor advances by exactly one page length per yielded page.
//! Invariants: An empty page ends the stream; an ended stream never fetches again.
//! Invariants: A failed pull poisons the stream; later pulls return `Usage` errors.
use super::ApiResult;
use super::fetch::{PageFetcher, Query};
use crate::core::cursor::StreamCursor;
use crate::core::decode::decode_page;
use crate::core::error::{Error, ErrorKind};
use crate::core::page::Page;
use crate::core::request::DatasetSource;
use crate::core::transform::Transform;
use futures_util::Stream;
use futures_util::stream;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum StreamState {
    Active,
    Exhausted,
    Failed,
}

pub struct RowStream<T> {
    source: DatasetSource,
    split: String,
    config: String,
    cursor: StreamCursor,
    fetcher: Arc<dyn PageFetcher>,
    transform: Transform,
    state: StreamState,
    _row: PhantomData<fn() -> T>,
}

impl<T> RowStream<T>
where
    T: DeserializeOwned,
{
    pub(crate) fn new(
        source: DatasetSource,
        split: String,
        config: String,
        cursor: StreamCursor,
        fetcher: Arc<dyn PageFetcher>,
        transform: Transform,
    ) -> Self {
        Self {
            source,
            split,
            config,
            cursor,
            fetcher,
            transform,
            state: StreamState::Active,
            _row: PhantomData,
        }
    }

    /// Fetches the page at the current offset.
    ///
    /// Returns `Ok(None)` once the service answers with an empty page, and on
    /// every call after that.
    pub async fn next_page(&mut self) -> ApiResult<Option<Page<T>>> {
        match self.state {
            StreamState::Active => {}
            StreamState::Exhausted => return Ok(None),
            StreamState::Failed => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("row stream already failed")
                    .with_hint("create a new stream to resume from a known offset"));
            }
        }

        let query = Query::rows(&self.source, &self.split, &self.config, self.cursor);
        debug!(
            dataset = %self.source,
            split = %self.split,
            offset = self.cursor.offset(),
            length = self.cursor.length(),
            "pulling page"
        );

        let outcome = match self.fetcher.fetch(query).await {
            Ok(raw) => decode_page::<T>(raw, &self.transform),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(page) if page.is_empty() => {
                debug!(dataset = %self.source, offset = self.cursor.offset(), "stream exhausted");
                self.state = StreamState::Exhausted;
                Ok(None)
            }
            Ok(page) => {
                self.cursor.advance();
                Ok(Some(page))
            }
            Err(err) => {
                warn!(dataset = %self.source, offset = self.cursor.offset(), error = %err, "pull failed");
                self.state = StreamState::Failed;
                Err(err)
            }
        }
    }

    /// Stops the stream without fetching; later pulls return `Ok(None)`.
    pub fn cancel(&mut self) {
        if self.state == StreamState::Active {
            self.state = StreamState::Exhausted;
        }
    }

    pub fn cursor(&self) -> StreamCursor {
        self.cursor
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == StreamState::Exhausted
    }

    /// Adapts the pull API into a `Stream` that ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = ApiResult<Page<T>>> {
        stream::unfold(Some(self), |state| async move {
            let mut rows = state?;
            match rows.next_page().await {
                Ok(Some(page)) => Some((Ok(page), Some(rows))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

impl<T> fmt::Debug for RowStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream")
            .field("source", &self.source)
            .field("split", &self.split)
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("transform", &self.transform)
            .field("state", &self.state)
            .finish()
    }
}
