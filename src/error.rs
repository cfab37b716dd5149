//! Error taxonomy for one refresh cycle.
//!
//! Connectivity and query failures come from the connector, shaping failures
//! from the aggregation transforms. A country missing from the code lookup is
//! not an error at all.

use crate::view::Panel;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to the query service.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("query service unreachable at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed broker response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("query rejected: {0}")]
    Rejected(String),
}

impl QueryError {
    /// True for failures where the service was never reached or never answered.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, QueryError::Connect { .. } | QueryError::Timeout(_))
    }
}

/// Failure turning query rows into a tabular result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("row {row}: expected {expected} columns, got {got}")]
    Arity {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("row {row}: {column} must be a number, got {value}")]
    NotNumeric {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: {column} must be text, got {value}")]
    NotText {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: unrecognised timestamp {value:?}")]
    Timestamp { row: usize, value: String },

    #[error("column {column} has {got} values, expected {expected}")]
    Ragged {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("duplicate column {0}")]
    DuplicateColumn(String),
}

/// A failed panel, tagged with the panel it broke.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{panel} panel: {source}")]
    Query {
        panel: Panel,
        #[source]
        source: QueryError,
    },

    #[error("{panel} panel: {source}")]
    Shape {
        panel: Panel,
        #[source]
        source: ShapeError,
    },
}

impl Error {
    pub fn panel(&self) -> Panel {
        match self {
            Error::Query { panel, .. } | Error::Shape { panel, .. } => *panel,
        }
    }
}
