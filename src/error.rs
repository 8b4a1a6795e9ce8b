//! Error types for the unreport library.

use std::io;
use thiserror::Error;

/// Result type alias for unreport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while turning a report into sections.
///
/// Only failures that prevent a document from being opened at all are
/// surfaced as errors by the pipeline. Page- and node-local problems are
/// absorbed and recorded as [`crate::model::Diagnostic`] values instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading an input or writing an output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and cannot be read.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// A bookmark could not be read faithfully (strict mode only).
    #[error("Invalid outline: {0}")]
    InvalidOutline(String),

    /// Error extracting text content from a page.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(usize, usize),

    /// Error serializing the parsed document.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the document could not be opened at all.
    ///
    /// Batch processing skips such files and moves on to the next one.
    pub fn is_document_open_failure(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::PdfParse(_)
                | Error::Encrypted
                | Error::Corrupted(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
