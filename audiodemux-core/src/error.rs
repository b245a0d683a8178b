//! Error types for the audiodemux workspace.

use thiserror::Error;

/// Main error type for audiodemux operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No container magic matched the leading bytes.
    #[error("Unable to detect file type")]
    FormatUnrecognized,

    /// Structurally invalid or truncated container.
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// Recognized container with an unsupported codec or field combination.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Ogg payload signature matched none of the supported codecs.
    #[error("Unexpected codec or stream found")]
    UnexpectedCodec,

    /// External decoder reported a failure.
    #[error("Decoder error: {0}")]
    Decoder(String),

    /// A decode capability could not be initialized.
    #[error("Decoder unavailable: {0}")]
    DecoderUnavailable(String),

    /// End of stream reached.
    #[error("End of stream")]
    EndOfStream,

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a malformed-container error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedContainer(msg.into())
    }

    /// Create an unsupported-format error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedFormat(msg.into())
    }

    /// Create a decoder error.
    pub fn decoder(msg: impl Into<String>) -> Self {
        Error::Decoder(msg.into())
    }

    /// Check if this is an end-of-stream error.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::malformed("no data chunk");
        assert_eq!(err.to_string(), "Malformed container: no data chunk");
    }

    #[test]
    fn test_unrecognized_display() {
        assert_eq!(
            Error::FormatUnrecognized.to_string(),
            "Unable to detect file type"
        );
    }

    #[test]
    fn test_is_eof() {
        assert!(Error::EndOfStream.is_eof());
        assert!(!Error::UnexpectedCodec.is_eof());
    }
}
