//! Flow Logs Insights query compiler
//!
//! Compiles a small filter/aggregation request into a CloudWatch Logs
//! Insights query for AWS VPC Flow Logs.
//!
//! # Architecture Overview
//!
//! ```text
//! Filter text
//!      |
//!   Lexer -> clauses (field, operator, value)
//!      |
//!   Parser + FieldRegistry -> Expr (typed, value-checked)
//!      |
//!   Builder + Schema -> validated state
//!      |
//!   Rendering -> parse ... | filter ... | stats ... | sort ... | limit ...
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fli_querybuilder::options::{with_filter, with_group_by, with_limit, with_verb};
//! use fli_querybuilder::{parse_filter, Builder, Verb, VpcFlowLogsSchema};
//!
//! let filter = parse_filter("dstport = 443 and action = 'REJECT'")?.unwrap();
//! let builder = Builder::new(
//!     Arc::new(VpcFlowLogsSchema::new()),
//!     [
//!         with_verb(Verb::Count),
//!         with_group_by(["srcaddr"]),
//!         with_filter(filter),
//!         with_limit(10),
//!     ],
//! )?;
//! assert!(builder
//!     .to_string()
//!     .ends_with("| filter dstport = 443 and action = 'REJECT' | stats count(*) as flows by srcaddr | sort flows desc | limit 10"));
//! # Ok::<(), fli_querybuilder::Error>(())
//! ```

pub mod analyzer;
pub mod ast;
pub mod builder;
pub mod error;
pub mod fields;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod schema;
pub mod token;
pub mod verb;
pub mod vpc_flow_logs;

// Re-export main types
pub use analyzer::validate_filter;
pub use ast::{Expr, Value};
pub use builder::{AggregationField, Builder};
pub use error::{Error, Result};
pub use fields::{FieldRegistry, FieldType};
pub use options::QueryOption;
pub use parser::{parse_filter, parse_filter_with_schema, FilterParser};
pub use schema::Schema;
pub use token::Operator;
pub use verb::Verb;
pub use vpc_flow_logs::VpcFlowLogsSchema;
