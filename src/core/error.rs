use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Transport,
    Validation,
    Io,
}

/// Which decoding pass rejected a payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationStage {
    /// The generic page or metadata envelope.
    Envelope,
    /// A row checked against the upstream shape before remapping.
    Upstream,
    /// A row checked against the caller's target shape.
    Target,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    url: Option<String>,
    status: Option<u16>,
    path: Option<String>,
    stage: Option<ValidationStage>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            url: None,
            status: None,
            path: None,
            stage: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn stage(&self) -> Option<ValidationStage> {
        self.stage
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_stage(mut self, stage: ValidationStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(stage) = self.stage {
            write!(f, " (stage: {stage:?})")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        if let Some(url) = &self.url {
            write!(f, " (url: {url})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Transport => 3,
        ErrorKind::Validation => 4,
        ErrorKind::Io => 5,
    }
}
