use std::path::PathBuf;
use thiserror::Error;

/// A single field of a source row that could not be coerced or violated
/// its declared range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}': {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Every condition that terminates a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("the csv file '{}' was not found", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("error opening csv file '{}': {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("invalid movie at data row {row}")]
    InvalidRow {
        row: usize,
        #[source]
        source: ValidationError,
    },

    #[error("invalid flag '{token}', please start flags with '--' followed by an argument")]
    MalformedArgument { token: String },

    #[error("missing argument value for flag: {flag}")]
    MissingFlagValue { flag: String },

    #[error("unknown flag: {flag}")]
    UnknownFlag { flag: String },

    #[error("{value} is not a valid argument for flag {flag}")]
    InvalidFilterValue { flag: String, value: String },

    #[error("unknown value '{value}' for flag {flag}")]
    UnknownCommandValue { flag: String, value: String },

    #[error("error writing to '{path}': {reason}")]
    OutputWrite { path: String, reason: String },
}

pub type Result<T, E = QueryError> = std::result::Result<T, E>;
