//! Query builder
//!
//! Accumulates aggregations, group-by fields, filters, limit and version, then
//! renders them as a pipe-delimited Logs Insights query:
//!
//! ```text
//! parse @message "..." as ... | filter ... | stats ... by ... | sort ... desc | limit n
//! ```
//!
//! State is changed only through [`QueryOption`]s (see [`crate::options`]),
//! each validated when applied.

use crate::analyzer::validate_filter;
use crate::ast::Expr;
use crate::error::{Error, Result};
use crate::options::QueryOption;
use crate::schema::Schema;
use crate::verb::Verb;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_LIMIT: i64 = 100;
pub const WILDCARD: &str = "*";

/// Alias used for `count(*)`
const FLOWS_ALIAS: &str = "flows";

/// One `stats` term: a verb applied to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationField {
    pub field: String,
    pub verb: Verb,
}

impl AggregationField {
    pub fn new(field: impl Into<String>, verb: Verb) -> Self {
        Self {
            field: field.into(),
            verb,
        }
    }

    /// `flows` for `count(*)`, otherwise `<field>_<verb>`.
    pub fn alias(&self) -> String {
        if self.field == WILDCARD && self.verb == Verb::Count {
            FLOWS_ALIAS.to_string()
        } else {
            format!("{}_{}", self.field, self.verb)
        }
    }
}

/// Query state for one request
pub struct Builder {
    pub(crate) aggregations: Vec<AggregationField>,
    pub(crate) fields: Vec<String>,
    pub(crate) pending_fields: Option<Vec<String>>,
    pub(crate) group_by: Vec<String>,
    pub(crate) filters: Vec<Expr>,
    pub(crate) limit: i64,
    pub(crate) version: u32,
    pub(crate) schema: Arc<dyn Schema>,
}

impl Builder {
    /// Start from the defaults (`count(*)`, limit 100, the schema's default
    /// version) and apply `options` in order. The first invalid option
    /// aborts construction.
    pub fn new(
        schema: Arc<dyn Schema>,
        options: impl IntoIterator<Item = QueryOption>,
    ) -> Result<Self> {
        let version = schema.default_version();
        let mut builder = Self {
            aggregations: vec![AggregationField::new(WILDCARD, Verb::Count)],
            fields: Vec::new(),
            pending_fields: None,
            group_by: Vec::new(),
            filters: Vec::new(),
            limit: DEFAULT_LIMIT,
            version,
            schema,
        };

        for option in options {
            builder.apply(option)?;
        }
        Ok(builder)
    }

    pub fn aggregations(&self) -> &[AggregationField] {
        &self.aggregations
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn filters(&self) -> &[Expr] {
        &self.filters
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn schema(&self) -> &dyn Schema {
        self.schema.as_ref()
    }

    pub(crate) fn set_verb(&mut self, verb: Verb) -> Result<()> {
        if verb == Verb::Raw {
            self.aggregations.clear();
            match self.pending_fields.take() {
                Some(pending) if !pending.is_empty() => self.fields = pending,
                _ if self.fields.is_empty() => self.fields = vec![WILDCARD.to_string()],
                _ => {}
            }
            return Ok(());
        }

        match self.aggregations.first_mut() {
            None => self.aggregations.push(AggregationField::new(WILDCARD, verb)),
            Some(first) => {
                if first.field != WILDCARD {
                    check_numeric(self.schema.as_ref(), &first.field, verb)?;
                }
                first.verb = verb;
            }
        }
        Ok(())
    }

    pub(crate) fn set_fields(&mut self, fields: Vec<String>) -> Result<()> {
        for field in &fields {
            self.validate_field(field)
                .map_err(|source| Error::InvalidField {
                    field: field.clone(),
                    source: Box::new(source),
                })?;
        }

        let Some(first) = self.aggregations.first_mut() else {
            self.fields = fields;
            return Ok(());
        };

        if let Some(field) = fields.first() {
            check_numeric(self.schema.as_ref(), field, first.verb)?;
            first.field = field.clone();
        }
        if !fields.is_empty() {
            self.pending_fields = Some(fields);
        }
        Ok(())
    }

    pub(crate) fn set_aggregations(&mut self, aggregations: Vec<AggregationField>) -> Result<()> {
        for agg in &aggregations {
            if agg.verb == Verb::Raw {
                return Err(Error::NotAnAggregation(agg.verb));
            }
            self.validate_field(&agg.field)
                .map_err(|source| Error::InvalidField {
                    field: agg.field.clone(),
                    source: Box::new(source),
                })?;
            check_numeric(self.schema.as_ref(), &agg.field, agg.verb)?;
        }
        self.aggregations = aggregations;
        Ok(())
    }

    pub(crate) fn set_group_by(&mut self, fields: Vec<String>) -> Result<()> {
        for field in &fields {
            self.validate_field(field)
                .map_err(|source| Error::InvalidGroupByField {
                    field: field.clone(),
                    source: Box::new(source),
                })?;
        }
        self.group_by = fields;
        Ok(())
    }

    pub(crate) fn set_limit(&mut self, limit: i64) -> Result<()> {
        if limit < 0 {
            return Err(Error::NegativeLimit);
        }
        self.limit = limit;
        Ok(())
    }

    pub(crate) fn add_filter(&mut self, filter: Expr) -> Result<()> {
        validate_filter(&filter, self.schema.as_ref(), self.version)?;
        self.filters.push(filter);
        Ok(())
    }

    pub(crate) fn set_version(&mut self, version: u32) -> Result<()> {
        self.schema
            .validate_version(version)
            .map_err(|source| Error::InvalidVersion {
                version,
                source: Box::new(source),
            })?;
        self.version = version;
        Ok(())
    }

    fn validate_field(&self, field: &str) -> Result<()> {
        self.schema.validate_field(field, self.version)
    }

    /// `field`, or `expression` when the field is computed.
    fn resolve_field<'a>(&'a self, field: &'a str) -> &'a str {
        self.schema
            .computed_field_expression(field, self.version)
            .unwrap_or(field)
    }

    /// `field`, or `expression as field` when the field is computed.
    fn projection(&self, field: &str) -> String {
        match self.schema.computed_field_expression(field, self.version) {
            Some(expr) => format!("{} as {}", expr, field),
            None => field.to_string(),
        }
    }

    /// Render the query. Fails only when the schema has no parse pattern for
    /// the configured version.
    pub fn to_query(&self) -> Result<String> {
        let mut parts = vec![self.schema.parse_pattern(self.version)?.to_string()];

        if !self.filters.is_empty() {
            let conditions: Vec<String> = self.filters.iter().map(|f| f.to_string()).collect();
            parts.push(format!("filter {}", conditions.join(" and ")));
        }

        if let Some(first) = self.aggregations.first() {
            parts.push(self.render_stats());
            parts.push(format!("sort {} desc", first.alias()));
        } else if self.fields.first().is_some_and(|f| f != WILDCARD) {
            let projections: Vec<String> =
                self.fields.iter().map(|f| self.projection(f)).collect();
            parts.push(format!("display {}", projections.join(", ")));
        }

        if self.limit > 0 {
            parts.push(format!("limit {}", self.limit));
        }

        let query = parts.join(" | ");
        debug!(version = self.version, query = %query, "rendered query");
        Ok(query)
    }

    fn render_stats(&self) -> String {
        let terms: Vec<String> = self
            .aggregations
            .iter()
            .map(|agg| {
                let function = agg.verb.stat_fn().unwrap_or(agg.verb.as_str());
                format!(
                    "{}({}) as {}",
                    function,
                    self.resolve_field(&agg.field),
                    agg.alias()
                )
            })
            .collect();

        let mut stats = format!("stats {}", terms.join(", "));
        if !self.group_by.is_empty() {
            let groups: Vec<String> = self.group_by.iter().map(|f| self.projection(f)).collect();
            stats.push_str(" by ");
            stats.push_str(&groups.join(", "));
        }
        stats
    }
}

/// Renders the query, or nothing when the version has no parse pattern.
impl fmt::Display for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_query() {
            Ok(query) => f.write_str(&query),
            Err(err) => {
                warn!(version = self.version, error = %err, "cannot render query");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("aggregations", &self.aggregations)
            .field("fields", &self.fields)
            .field("group_by", &self.group_by)
            .field("filters", &self.filters)
            .field("limit", &self.limit)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

fn check_numeric(schema: &dyn Schema, field: &str, verb: Verb) -> Result<()> {
    if verb.requires_numeric() && !schema.is_numeric(field) {
        return Err(Error::NonNumericField {
            field: field.to_string(),
            verb: verb.to_string(),
        });
    }
    Ok(())
}
