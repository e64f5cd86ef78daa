//! Error types for `OdysseyKit`

use thiserror::Error;

/// The error type for `OdysseyKit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Structural Format Errors ====================
    /// The data is structurally invalid: bad magic, truncated sections or
    /// offsets pointing outside the buffer.
    #[error("corrupt {format} data at offset {offset:#x}: {message}")]
    CorruptFormat {
        /// The format being parsed ("GFF", "SSF", "TLK", ...).
        format: &'static str,
        /// Byte offset at which the problem was detected.
        offset: u64,
        /// Description of what is wrong.
        message: String,
    },

    /// The detector could not identify the data, or the requested output
    /// format is not one the codec can produce.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    // ==================== GFF Errors ====================
    /// A field label cannot be stored in the 16-byte label table.
    #[error("invalid GFF label '{label}': labels are limited to 16 bytes")]
    InvalidLabel {
        /// The offending label.
        label: String,
    },

    /// An XML element or attribute does not describe a valid GFF tree.
    #[error("invalid GFF XML: {0}")]
    InvalidGffXml(String),

    /// Text holds characters the target code page cannot represent.
    #[error("cannot encode '{text}' as {encoding}")]
    UnencodableText {
        /// The text being encoded.
        text: String,
        /// Name of the code page.
        encoding: &'static str,
    },

    // ==================== SSF Errors ====================
    /// An XML element or attribute does not describe a valid sound set.
    #[error("invalid SSF XML: {0}")]
    InvalidSsfXml(String),

    // ==================== Parsing Errors ====================
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// XML attribute error.
    #[error("XML attribute error: {0}")]
    XmlAttrError(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A DLG snapshot does not have the expected shape.
    #[error("invalid DLG snapshot: {0}")]
    InvalidSnapshot(String),

    /// UTF-8 conversion error.
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// UTF-8 validation error on borrowed input.
    #[error("UTF-8 validation error: {0}")]
    Utf8StrError(#[from] std::str::Utf8Error),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl Error {
    /// Shorthand for building a [`Error::CorruptFormat`].
    pub(crate) fn corrupt(format: &'static str, offset: u64, message: impl Into<String>) -> Self {
        Error::CorruptFormat {
            format,
            offset,
            message: message.into(),
        }
    }
}

// Add conversion from quick_xml::events::attributes::AttrError
impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttrError(err.to_string())
    }
}

/// A specialized Result type for `OdysseyKit` operations.
pub type Result<T> = std::result::Result<T, Error>;
