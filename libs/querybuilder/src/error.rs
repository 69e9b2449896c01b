//! Error types for the query builder

use crate::verb::Verb;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Filter parsing, validation and query composition errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Lexical / syntactic
    #[error("invalid filter clause: {0:?}")]
    InvalidFilterClause(String),

    #[error("empty parenthesized group in filter: {0:?}")]
    EmptyGroup(String),

    #[error("filter too deeply nested (max depth: {0})")]
    TooDeeplyNested(usize),

    #[error("invalid port value: {0}")]
    InvalidPortValue(String),

    #[error("port out of range: {0}")]
    PortOutOfRange(i64),

    #[error("invalid numeric value for field {field}: {value}")]
    InvalidNumericValue { field: String, value: String },

    #[error("invalid IP, CIDR, or prefix value for field {field}: {value}")]
    InvalidIpValue { field: String, value: String },

    #[error("invalid CIDR block: {0}")]
    InvalidCidrBlock(String),

    // Semantic
    #[error("empty '{0}' expression")]
    EmptyCombinator(&'static str),

    #[error("unsupported operator for {class} field: {operator:?}")]
    UnsupportedOperator { class: String, operator: String },

    #[error("invalid field '{field}' for version {version}")]
    UnknownField { field: String, version: u32 },

    #[error("field '{field}' must be numeric for verb '{verb}'")]
    NonNumericField { field: String, verb: String },

    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("verb '{0}' is not an aggregation")]
    NotAnAggregation(Verb),

    #[error("limit must be non-negative")]
    NegativeLimit,

    // Configuration
    #[error("invalid flow log version: {0}")]
    UnsupportedVersion(u32),

    #[error("unsupported VPC Flow Log version for parse pattern: {0}")]
    NoParsePattern(u32),

    // Context wrappers
    #[error("invalid field '{field}': {source}")]
    InvalidField {
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid group by field '{field}': {source}")]
    InvalidGroupByField {
        field: String,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid version {version}: {source}")]
    InvalidVersion {
        version: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Walk `#[source]` wrappers down to the error that caused them.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::InvalidField { source, .. }
            | Error::InvalidGroupByField { source, .. }
            | Error::InvalidVersion { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
