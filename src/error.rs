use thiserror::Error;

/// Failures while downloading or decoding a spreadsheet source
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("CSV could not be parsed: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook could not be read: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("worksheet {0} not found")]
    WorksheetNotFound(String),
    #[error("source has no header row")]
    NoHeader,
}

/// Failures while joining the two datasets
#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error("'{key}' column must exist in both tables.\nLeft: {left:?}\nRight: {right:?}")]
    MissingKey {
        key: String,
        left: Vec<String>,
        right: Vec<String>,
    },
    #[error("column '{0}' exists in both tables and no collision policy covers it")]
    UnresolvedCollision(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx writer failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("could not write export file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}
