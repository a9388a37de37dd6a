use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("HTTP client error: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Could not build address from row {row}: missing column '{column}' in {record}")]
    MissingField {
        row: usize,
        column: String,
        record: String,
    },

    #[error("Input column '{column}' collides with a geocoder output column")]
    ColumnCollision { column: String },

    #[error("Input column '{column}' appears more than once in the header")]
    DuplicateColumn { column: String },

    #[error("Output file already exists: {path}")]
    OutputExists { path: String },
}

pub type Result<T> = std::result::Result<T, GeocodeError>;

/// Failure of a single geocoding request. Always recovered per row.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no match")]
    NoMatch,

    #[error("rejected by provider ({status}){}", detail_suffix(.message))]
    Rejected {
        status: String,
        message: Option<String>,
    },
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Extraction,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl GeocodeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GeocodeError::ConfigValidationError { .. }
            | GeocodeError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            GeocodeError::CsvError(_)
            | GeocodeError::ColumnCollision { .. }
            | GeocodeError::DuplicateColumn { .. } => ErrorCategory::Input,
            GeocodeError::MissingField { .. } => ErrorCategory::Extraction,
            GeocodeError::OutputExists { .. } => ErrorCategory::Output,
            GeocodeError::IoError(_) | GeocodeError::ApiError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GeocodeError::ApiError(_) => ErrorSeverity::Medium,
            GeocodeError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the command line options and the TOML configuration file"
            }
            ErrorCategory::Input => "Make sure the source file is a CSV with a header row of unique column names",
            ErrorCategory::Extraction => {
                "Fill in the missing column or adjust the [input] field mapping"
            }
            ErrorCategory::Output => {
                "Remove the existing output file or set output.overwrite = true"
            }
            ErrorCategory::System => "Check file permissions and network connectivity",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            GeocodeError::IoError(e) => format!("File access failed: {}", e),
            GeocodeError::CsvError(e) => format!("Could not read CSV data: {}", e),
            GeocodeError::MissingField { row, column, .. } => {
                format!("Row {} has no value for required column '{}'", row, column)
            }
            other => other.to_string(),
        }
    }
}
