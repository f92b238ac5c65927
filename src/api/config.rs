//! Purpose: Hold the settings needed to build a dataset client.
//! Exports: `ClientConfig`, `DEFAULT_BASE_URL`.
//! Role: Explicit configuration value; callers resolve credentials themselves.
//! Invariants: Nothing here reads environment variables.
use crate::core::request::DEFAULT_PAGE_LENGTH;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://datasets-server.huggingface.co";

#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub default_length: u64,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_default_length(mut self, length: u64) -> Self {
        self.default_length = length;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            default_length: DEFAULT_PAGE_LENGTH,
            timeout: None,
        }
    }
}

// Keeps the token out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("default_length", &self.default_length)
            .field("timeout", &self.timeout)
            .finish()
    }
}
