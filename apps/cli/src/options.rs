//! Command line arguments to query builder options

use anyhow::{bail, Context};
use clap::Args;
use fli_querybuilder::options::{
    with_aggregations, with_fields, with_filter, with_group_by, with_limit, with_verb,
    with_version,
};
use fli_querybuilder::{
    parse_filter_with_schema, AggregationField, Builder, Expr, QueryOption, Schema, Verb,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::collection::{NamedQuery, QueryCollection, QueryConfig};
use crate::config::QueryDefaults;

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Verb: raw, count, sum, avg, min or max
    pub verb: String,

    /// Fields to aggregate or display, comma separated
    pub fields: Vec<String>,

    /// Filter expression, e.g. "dstport = 22 and action = REJECT"
    #[arg(long)]
    pub filter: Option<String>,

    /// Group-by fields, comma separated
    #[arg(long)]
    pub by: Option<String>,

    /// Maximum number of rows (0 for no limit clause)
    #[arg(long, short = 'l')]
    pub limit: Option<i64>,

    /// Flow log record version (2, 3 or 5)
    #[arg(long, short = 'v')]
    pub version: Option<u32>,

    /// CloudWatch log group, recorded in collection output
    #[arg(long)]
    pub log_group: Option<String>,

    /// Print the filter tree and query state as JSON
    #[arg(long)]
    pub explain: bool,

    /// Print the request as a YAML query collection
    #[arg(long)]
    pub collection: bool,

    /// Query name for collection output
    #[arg(long)]
    pub name: Option<String>,

    /// Query description for collection output
    #[arg(long)]
    pub description: Option<String>,

    /// Query tags for collection output, comma separated
    #[arg(long)]
    pub tags: Option<String>,
}

impl QueryArgs {
    pub fn to_config(&self) -> QueryConfig {
        QueryConfig {
            verb: self.verb.clone(),
            fields: parse_fields(&self.fields),
            log_group: self.log_group.clone(),
            filter: self.filter.clone(),
            by: self.by.clone(),
            limit: self.limit,
            version: self.version,
        }
    }

    /// Single-entry collection describing this request.
    pub fn to_collection(&self) -> QueryCollection {
        QueryCollection {
            queries: vec![NamedQuery {
                name: self.name.clone(),
                description: self.description.clone(),
                tags: self.tags.as_deref().map(split_list).unwrap_or_default(),
                config: self.to_config(),
            }],
        }
    }
}

/// Join positional arguments with spaces, then split on commas, so both
/// `bytes,packets` and `bytes, packets` name two fields.
pub fn parse_fields(args: &[String]) -> Vec<String> {
    split_list(&args.join(" "))
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Translate a request into builder options.
///
/// The version option comes first so every later field check runs against
/// the requested version.
pub fn build_options(
    schema: &dyn Schema,
    config: &QueryConfig,
    defaults: &QueryDefaults,
) -> anyhow::Result<Vec<QueryOption>> {
    if config.verb.trim().is_empty() {
        bail!("verb is required");
    }
    let verb: Verb = config
        .verb
        .parse()
        .with_context(|| format!("invalid verb '{}'", config.verb))?;

    let mut options = vec![
        with_version(config.version.unwrap_or(defaults.version)),
        with_limit(config.limit.unwrap_or(defaults.limit)),
    ];

    let fields: Vec<String> = config.fields.iter().flat_map(|f| split_list(f)).collect();
    if verb == Verb::Raw {
        options.push(with_verb(Verb::Raw));
        if !fields.is_empty() {
            options.push(with_fields(fields));
        }
    } else {
        options.push(with_verb(verb));
        if !fields.is_empty() {
            options.push(with_aggregations(
                fields.into_iter().map(|field| AggregationField::new(field, verb)),
            ));
        }
    }

    if let Some(by) = config.by.as_deref() {
        let groups = split_list(by);
        if !groups.is_empty() {
            options.push(with_group_by(groups));
        }
    }

    if let Some(text) = config.filter.as_deref() {
        let filter = parse_filter_with_schema(text, schema).context("invalid filter expression")?;
        if let Some(expr) = filter {
            options.push(with_filter(expr));
        }
    }

    debug!(options = options.len(), verb = %verb, "built query options");
    Ok(options)
}

/// Builder state and the rendered query, for `--explain`
#[derive(Debug, Serialize)]
pub struct Explanation {
    pub version: u32,
    pub aggregations: Vec<AggregationField>,
    pub fields: Vec<String>,
    pub group_by: Vec<String>,
    pub filters: Vec<Expr>,
    pub limit: i64,
    pub query: String,
}

pub fn build(
    schema: Arc<dyn Schema>,
    config: &QueryConfig,
    defaults: &QueryDefaults,
) -> anyhow::Result<Builder> {
    let options = build_options(schema.as_ref(), config, defaults)?;
    Builder::new(schema, options).context("invalid query")
}

pub fn compile(
    schema: Arc<dyn Schema>,
    config: &QueryConfig,
    defaults: &QueryDefaults,
) -> anyhow::Result<String> {
    let builder = build(schema, config, defaults)?;
    builder.to_query().context("failed to render query")
}

pub fn explain(
    schema: Arc<dyn Schema>,
    config: &QueryConfig,
    defaults: &QueryDefaults,
) -> anyhow::Result<Explanation> {
    let builder = build(schema, config, defaults)?;
    Ok(Explanation {
        version: builder.version(),
        aggregations: builder.aggregations().to_vec(),
        fields: builder.fields().to_vec(),
        group_by: builder.group_by().to_vec(),
        filters: builder.filters().to_vec(),
        limit: builder.limit(),
        query: builder.to_query().context("failed to render query")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fli_querybuilder::vpc_flow_logs::{PARSE_PATTERN_V2, PARSE_PATTERN_V3};
    use fli_querybuilder::VpcFlowLogsSchema;

    fn schema() -> Arc<dyn Schema> {
        Arc::new(VpcFlowLogsSchema::new())
    }

    fn args(verb: &str, fields: &[&str]) -> QueryArgs {
        QueryArgs {
            verb: verb.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    fn compile_args(args: &QueryArgs) -> anyhow::Result<String> {
        compile(schema(), &args.to_config(), &QueryDefaults::default())
    }

    #[test]
    fn test_parse_fields() {
        let raw = vec!["bytes,".to_string(), "packets".to_string()];
        assert_eq!(parse_fields(&raw), vec!["bytes", "packets"]);
        let raw = vec!["srcaddr, dstaddr".to_string()];
        assert_eq!(parse_fields(&raw), vec!["srcaddr", "dstaddr"]);
        assert!(parse_fields(&[]).is_empty());
    }

    #[test]
    fn test_count_defaults() {
        let query = compile_args(&args("count", &[])).unwrap();
        assert_eq!(
            query,
            format!("{} | stats count(*) as flows | sort flows desc | limit 20", PARSE_PATTERN_V2)
        );
    }

    #[test]
    fn test_count_with_fields_counts_each() {
        let mut a = args("count", &["srcaddr,dstaddr"]);
        a.by = Some("action".into());
        let query = compile_args(&a).unwrap();
        assert!(query.ends_with(
            "| stats count(srcaddr) as srcaddr_count, count(dstaddr) as dstaddr_count by action | sort srcaddr_count desc | limit 20"
        ));
    }

    #[test]
    fn test_sum_requires_numeric_field() {
        let err = compile_args(&args("sum", &["srcaddr"])).unwrap_err();
        assert!(format!("{:#}", err).contains("field 'srcaddr' must be numeric for verb 'sum'"));
    }

    #[test]
    fn test_raw_with_filter_and_version() {
        let mut a = args("RAW", &["srcaddr,", "vpc_id"]);
        a.filter = Some("vpc_id = vpc-1 and duration > 10".into());
        a.version = Some(3);
        a.limit = Some(5);
        let query = compile_args(&a).unwrap();
        assert_eq!(
            query,
            format!(
                "{} | filter vpc_id = 'vpc-1' and (end - start) > 10 | display srcaddr, vpc_id | limit 5",
                PARSE_PATTERN_V3
            )
        );
    }

    #[test]
    fn test_invalid_verb() {
        let err = compile_args(&args("median", &[])).unwrap_err();
        assert_eq!(err.to_string(), "invalid verb 'median'");
    }

    #[test]
    fn test_invalid_filter() {
        let mut a = args("count", &[]);
        a.filter = Some("srcport = 70000".into());
        let err = compile_args(&a).unwrap_err();
        assert_eq!(format!("{:#}", err), "invalid filter expression: port out of range: 70000");
    }

    #[test]
    fn test_collection_output() {
        let mut a = args("avg", &["bytes"]);
        a.name = Some("avg-bytes".into());
        a.tags = Some("traffic, volume".into());
        let collection = a.to_collection();
        assert_eq!(collection.queries[0].tags, vec!["traffic", "volume"]);

        let yaml = collection.to_yaml().unwrap();
        let parsed = QueryCollection::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.queries[0].config.fields, vec!["bytes"]);
        assert_eq!(parsed.queries[0].config.verb, "avg");
    }

    #[test]
    fn test_explain() {
        let mut a = args("max", &["packets"]);
        a.filter = Some("protocol = udp".into());
        let explanation = explain(schema(), &a.to_config(), &QueryDefaults::default()).unwrap();
        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json["aggregations"][0]["verb"], "max");
        assert_eq!(json["filters"][0]["type"], "eq");
        assert_eq!(json["filters"][0]["value"], 17);
        assert!(explanation.query.contains("stats max(packets) as packets_max"));
    }
}
