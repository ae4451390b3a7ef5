//! Error types for the exstruct library.

use std::io;
use thiserror::Error;

/// Result type alias for exstruct operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during workbook processing.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The file format is recognized but not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the workbook.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required workbook component is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// A referenced worksheet was not found.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// The live-automation driver reported a failure.
    #[error("Automation error: {0}")]
    Automation(String),

    /// A detection backend could not be obtained.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Error during output serialization.
    #[error("Serialize error: {0}")]
    Serialize(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}
