//! Semantic validation of filter trees against a schema

use crate::ast::{is_computed_expression, Expr};
use crate::error::{Error, Result};
use crate::schema::Schema;
use tracing::trace;

/// Check every leaf field of `expr` against `schema` at `version`.
///
/// Fields that are already computed expressions (`end - start`) were produced
/// by the parser from a computed field and are accepted as-is. Combinators
/// must have at least one operand.
pub fn validate_filter(expr: &Expr, schema: &dyn Schema, version: u32) -> Result<()> {
    match expr {
        Expr::And { operands } => validate_operands(operands, "and", schema, version),
        Expr::Or { operands } => validate_operands(operands, "or", schema, version),
        Expr::Not { inner } => validate_filter(inner, schema, version),
        Expr::Eq { field, .. }
        | Expr::Neq { field, .. }
        | Expr::Gt { field, .. }
        | Expr::Lt { field, .. }
        | Expr::Gte { field, .. }
        | Expr::Lte { field, .. }
        | Expr::Like { field, .. }
        | Expr::NotLike { field, .. }
        | Expr::IsIpv4InSubnet { field, .. } => validate_leaf_field(field, schema, version),
    }
}

fn validate_operands(
    operands: &[Expr],
    keyword: &'static str,
    schema: &dyn Schema,
    version: u32,
) -> Result<()> {
    if operands.is_empty() {
        return Err(Error::EmptyCombinator(keyword));
    }
    operands
        .iter()
        .try_for_each(|operand| validate_filter(operand, schema, version))
}

fn validate_leaf_field(field: &str, schema: &dyn Schema, version: u32) -> Result<()> {
    if is_computed_expression(field) {
        trace!(field = %field, "skipping computed expression");
        return Ok(());
    }
    schema.validate_field(field, version)
}
