//! Error types for the identifier matching engine.
//!
//! Only the failures that abort a run live here. Problems confined to a single
//! page are logged and recorded on the page outcome instead.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading inputs or producing output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Identifier source has no columns, or the document cannot be opened at all.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Page index outside the document
    #[error("Page {index} out of range (document has {count} pages)")]
    PageOutOfRange {
        /// Requested page index (0-based)
        index: usize,
        /// Number of pages in the document
        count: usize,
    },

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spreadsheet could not be decoded
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Delimited text could not be decoded
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// PDF backend error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors that mean the input itself is unusable.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Error::MalformedInput(_) | Error::Spreadsheet(_) | Error::Csv(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_message() {
        let err = Error::MalformedInput("identifier source has no columns".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Malformed input"));
        assert!(msg.contains("no columns"));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_page_out_of_range_message() {
        let err = Error::PageOutOfRange { index: 7, count: 3 };
        assert_eq!(format!("{}", err), "Page 7 out of range (document has 3 pages)");
        assert!(!err.is_malformed_input());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pdf");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
