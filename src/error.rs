//! Error kinds for the DWVW codec and its AIFF/AIFC container plumbing.
//!
//! Every variant is treated as fatal by the CLI: print a message, exit 1,
//! no partial output. Callers that need more than that (tests, the
//! driver) can match on *kind* instead of scraping a formatted string.

pub type R<T> = Result<T, DwvwError>;

#[derive(Debug, thiserror::Error)]
pub enum DwvwError {
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("unsupported input compression {found:?}, expected {expected:?}")]
    UnsupportedCompression {
        found: [u8; 4],
        expected: &'static [u8; 4],
    },

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("codec overflow: {0}")]
    CodecOverflow(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DwvwError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        DwvwError::MalformedContainer(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        DwvwError::OutOfRange(msg.into())
    }

    pub fn overflow(msg: impl Into<String>) -> Self {
        DwvwError::CodecOverflow(msg.into())
    }
}
