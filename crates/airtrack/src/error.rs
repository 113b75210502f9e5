//! Error types for airtrack.
//!
//! This module defines all error types used throughout the airtrack crate.
//! Input errors carry the offending field and value together with the
//! expected domain, so callers can render a direct error message without
//! re-deriving context.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for airtrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// A filter criterion referenced a value outside its domain.
    #[error("invalid filter value for '{field}': '{value}' (expected {expected})")]
    InvalidFilterValue {
        /// The filter field that failed validation.
        field: &'static str,
        /// The value supplied by the caller.
        value: String,
        /// Description of the accepted domain.
        expected: String,
    },

    /// An aggregation request named an unknown group key or metric.
    #[error("invalid aggregation spec for '{field}': '{value}' (expected {expected})")]
    InvalidAggregationSpec {
        /// The aggregation field that failed validation.
        field: &'static str,
        /// The value supplied by the caller.
        value: String,
        /// Description of the accepted domain.
        expected: String,
    },

    /// The requested query name is not in the catalog.
    #[error("unknown query '{name}' (known queries: {known})")]
    UnknownQuery {
        /// The name the caller asked for.
        name: String,
        /// Comma-separated list of catalog entries.
        known: String,
    },

    /// A query parameter was missing, unexpected, or malformed.
    #[error("invalid parameter '{name}' for query '{query}': {message}")]
    InvalidParameter {
        /// The catalog entry being run.
        query: String,
        /// The parameter name.
        name: String,
        /// What went wrong.
        message: String,
    },

    // === Resource Errors ===
    /// A query scanned more records than the configured budget allows.
    #[error("query '{query}' too expensive: scanned {scanned} records (budget {budget}); narrow the filter")]
    QueryTooExpensive {
        /// The catalog entry being run.
        query: String,
        /// Records examined before giving up.
        scanned: usize,
        /// The configured scan budget.
        budget: usize,
    },

    // === Data Errors ===
    /// Failed to open the dataset file.
    #[error("failed to open dataset at {path}: {source}")]
    DatasetOpen {
        /// Path to the dataset file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// Reading from the dataset file failed.
    #[error("dataset query failed: {0}")]
    DatasetQuery(#[from] rusqlite::Error),

    /// The dataset violates referential integrity or contains malformed rows.
    #[error("dataset integrity violation: {message}")]
    DatasetIntegrity {
        /// Description of the violation.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for airtrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an invalid filter value error.
    #[must_use]
    pub fn invalid_filter_value(
        field: &'static str,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidFilterValue {
            field,
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create an invalid aggregation spec error.
    #[must_use]
    pub fn invalid_aggregation_spec(
        field: &'static str,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidAggregationSpec {
            field,
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create an unknown query error listing the known catalog entries.
    #[must_use]
    pub fn unknown_query(name: impl Into<String>, known: &[&str]) -> Self {
        Self::UnknownQuery {
            name: name.into(),
            known: known.join(", "),
        }
    }

    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(
        query: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            query: query.into(),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a query-too-expensive error.
    #[must_use]
    pub fn too_expensive(query: impl Into<String>, scanned: usize, budget: usize) -> Self {
        Self::QueryTooExpensive {
            query: query.into(),
            scanned,
            budget,
        }
    }

    /// Create a dataset integrity error.
    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::DatasetIntegrity {
            message: message.into(),
        }
    }

    /// Check whether this error is the caller's fault (malformed input).
    ///
    /// Input errors are reported back as structured results; they never
    /// indicate a problem with the dataset or the engine itself.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilterValue { .. }
                | Self::InvalidAggregationSpec { .. }
                | Self::UnknownQuery { .. }
                | Self::InvalidParameter { .. }
        )
    }

    /// Check whether this error indicates the query exceeded its scan budget.
    #[must_use]
    pub fn is_too_expensive(&self) -> bool {
        matches!(self, Self::QueryTooExpensive { .. })
    }
}
