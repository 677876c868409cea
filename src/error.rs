use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Which part of a raw record failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationField {
    Date,
    Balance,
    Time,
}

impl fmt::Display for ObservationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationField::Date => write!(f, "date"),
            ObservationField::Balance => write!(f, "balance"),
            ObservationField::Time => write!(f, "time"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AdbError {
    #[error("Malformed observation #{index}: {field} '{value}' {reason}")]
    MalformedObservation {
        index: usize,
        field: ObservationField,
        value: String,
        reason: String,
    },

    #[error("Extraction returned no balance observations; balance history unknown for entire range")]
    EmptyExtraction,

    #[error("Invalid analysis range: {0}")]
    InvalidRange(String),

    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[cfg(feature = "gemini")]
    #[error("Extraction with model '{model}' timed out after {seconds}s")]
    ExtractionTimeout { model: String, seconds: u64 },

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl AdbError {
    pub(crate) fn malformed(
        index: usize,
        field: ObservationField,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AdbError::MalformedObservation {
            index,
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn inverted_range(start: NaiveDate, end: NaiveDate) -> Self {
        AdbError::InvalidRange(format!("start {} is after end {}", start, end))
    }

    /// True for errors caused by the extracted data rather than by the caller.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            AdbError::MalformedObservation { .. }
                | AdbError::EmptyExtraction
                | AdbError::ArithmeticOverflow(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AdbError>;
