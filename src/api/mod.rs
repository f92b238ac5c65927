//! Purpose: Define the public Rust API boundary for rowpager.
//! Exports: Client, fetcher seam, row streams, interleaving, config, and core types.
//! Role: Public surface used by the CLI, tests, and library callers.
//! Invariants: Everything network-bound goes through `PageFetcher`.

mod client;
mod config;
mod fetch;
mod interleave;
mod metadata;
mod stream;

pub type ApiResult<T> = Result<T, Error>;

pub use crate::core::cursor::StreamCursor;
pub use crate::core::error::{Error, ErrorKind, ValidationStage, to_exit_code};
pub use crate::core::page::{DtypeSpec, FeatureDescriptor, FeatureType, Page, RowRecord};
pub use crate::core::request::{DEFAULT_PAGE_LENGTH, DatasetSource, PageRequest};
pub use crate::core::transform::Transform;
pub use client::DatasetClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use fetch::{Endpoint, HttpFetcher, PageFetcher, Query};
pub use interleave::{Interleave, interleave};
pub use metadata::{
    DatasetInfo, DatasetInfoBody, DatasetVersion, ParquetFile, ParquetFiles, SplitEntry,
    SplitInfo, Splits, Validity,
};
pub use stream::RowStream;
