//! Purpose: Typed payloads for the dataset metadata endpoints.
//! Exports: `Validity`, `Splits`, `SplitEntry`, `DatasetInfo`, `DatasetInfoBody`,
//! Exports: `DatasetVersion`, `SplitInfo`, `ParquetFiles`, `ParquetFile`.
//! Role: Decoded with the same shape checks as row pages (stage `Envelope`).
//! Invariants: Unknown extra fields are ignored; missing or mistyped fields fail.
use crate::core::error::{Error, ValidationStage};
use crate::core::schema::{Violation, child_path, index_path};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Validity {
    pub viewer: bool,
    pub preview: bool,
    pub search: bool,
    pub filter: bool,
    pub statistics: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Splits {
    pub splits: Vec<SplitEntry>,
    pub pending: Vec<Value>,
    pub failed: Vec<Value>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SplitEntry {
    pub dataset: String,
    pub config: String,
    pub split: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub dataset_info: DatasetInfoBody,
    pub partial: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfoBody {
    pub description: String,
    pub citation: String,
    pub homepage: String,
    pub license: String,
    pub features: Map<String, Value>,
    pub builder_name: String,
    pub dataset_name: String,
    pub config_name: String,
    pub version: DatasetVersion,
    pub splits: BTreeMap<String, SplitInfo>,
    pub download_size: u64,
    pub dataset_size: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub version_str: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SplitInfo {
    pub name: String,
    pub num_bytes: u64,
    pub num_examples: u64,
    pub dataset_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParquetFiles {
    pub parquet_files: Vec<ParquetFile>,
    pub pending: Vec<Value>,
    pub failed: Vec<Value>,
    pub partial: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ParquetFile {
    pub dataset: String,
    pub config: String,
    pub split: String,
    pub url: Url,
    pub filename: String,
    pub size: u64,
}

impl ParquetFiles {
    /// Rejects zero-sized entries, which the service only emits for broken exports.
    pub(crate) fn check_sizes(self) -> Result<Self, Error> {
        if let Some(position) = self.parquet_files.iter().position(|file| file.size == 0) {
            let path = child_path(&index_path("parquet_files", position), "size");
            return Err(Violation::new(path, "parquet file size must be positive")
                .into_error(ValidationStage::Envelope));
        }
        Ok(self)
    }
}
