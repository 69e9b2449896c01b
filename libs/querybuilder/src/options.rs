//! Builder configuration options
//!
//! Options are plain values applied to a [`Builder`] in order. Each one is
//! validated against the builder's schema as it is applied; the first
//! failure stops the pipeline.

use crate::ast::Expr;
use crate::builder::{AggregationField, Builder};
use crate::error::Result;
use crate::verb::Verb;
use tracing::trace;

/// A single change to builder state
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOption {
    /// Raw clears aggregations; any other verb replaces the first aggregation's verb.
    Verb(Verb),
    /// Projected fields for raw queries, or the first aggregation's field.
    Fields(Vec<String>),
    /// Replaces the aggregation list. Non-count verbs need numeric fields.
    Aggregations(Vec<AggregationField>),
    GroupBy(Vec<String>),
    Limit(i64),
    /// Appended to the filter list; filters are joined with `and`.
    Filter(Expr),
    Version(u32),
}

pub fn with_verb(verb: Verb) -> QueryOption {
    QueryOption::Verb(verb)
}

pub fn with_fields<I, S>(fields: I) -> QueryOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    QueryOption::Fields(fields.into_iter().map(Into::into).collect())
}

pub fn with_aggregations(aggregations: impl IntoIterator<Item = AggregationField>) -> QueryOption {
    QueryOption::Aggregations(aggregations.into_iter().collect())
}

pub fn with_group_by<I, S>(fields: I) -> QueryOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    QueryOption::GroupBy(fields.into_iter().map(Into::into).collect())
}

pub fn with_limit(limit: i64) -> QueryOption {
    QueryOption::Limit(limit)
}

pub fn with_filter(filter: Expr) -> QueryOption {
    QueryOption::Filter(filter)
}

pub fn with_version(version: u32) -> QueryOption {
    QueryOption::Version(version)
}

impl Builder {
    /// Apply one option.
    pub fn apply(&mut self, option: QueryOption) -> Result<()> {
        trace!(?option, "applying query option");
        match option {
            QueryOption::Verb(verb) => self.set_verb(verb),
            QueryOption::Fields(fields) => self.set_fields(fields),
            QueryOption::Aggregations(aggs) => self.set_aggregations(aggs),
            QueryOption::GroupBy(fields) => self.set_group_by(fields),
            QueryOption::Limit(limit) => self.set_limit(limit),
            QueryOption::Filter(filter) => self.add_filter(filter),
            QueryOption::Version(version) => self.set_version(version),
        }
    }
}
