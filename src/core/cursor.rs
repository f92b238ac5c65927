// Offset cursor owned by a single row stream.
use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamCursor {
    offset: u64,
    length: u64,
}

impl StreamCursor {
    pub fn new(offset: u64, length: u64) -> Result<Self, Error> {
        if length == 0 {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("page length must be greater than zero")
                .with_hint("pass a length of at least 1 (the service caps pages at 100 rows)"));
        }
        Ok(Self { offset, length })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Moves past the page that was just yielded.
    pub(crate) fn advance(&mut self) {
        self.offset = self.offset.saturating_add(self.length);
    }
}
