use std::fmt;

pub const DEFAULT_PAGE_LENGTH: u64 = 100;

/// Identifier of a remote dataset, e.g. `rajpurkar/squad`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct DatasetSource(String);

impl DatasetSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetSource {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DatasetSource {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageRequest {
    pub split: String,
    pub config: String,
    pub offset: Option<u64>,
    pub length: Option<u64>,
}

impl PageRequest {
    pub fn new(split: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            split: split.into(),
            config: config.into(),
            offset: None,
            length: None,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }
}
