//! Filter parser - converts filter text to an [`Expr`] tree
//!
//! Recursive descent over the lexer's operand splitter.
//! Precedence (lowest to highest):
//! 1. or
//! 2. and
//! 3. primary (parenthesized group or a single `field op value` clause)
//!
//! ```text
//! Or      := And ("or" And)*
//! And     := Primary ("and" Primary)*
//! Primary := "(" Or ")" | Clause
//! ```
//!
//! A level with a single operand passes straight through, so `And`/`Or`
//! nodes only appear with two or more operands.

use crate::ast::Expr;
use crate::error::{Error, Result};
use crate::fields::{build_comparison, FieldRegistry};
use crate::lexer::{quoted_mask, split_clause, split_on_logical};
use crate::schema::Schema;
use crate::token::LogicalOperator;
use tracing::debug;

const MAX_RECURSION_DEPTH: usize = 200;

/// Parser for filter expressions
pub struct FilterParser<'a> {
    registry: &'a FieldRegistry,
    schema: Option<&'a dyn Schema>,
    recursion_depth: usize,
}

impl<'a> FilterParser<'a> {
    pub fn new(registry: &'a FieldRegistry) -> Self {
        Self {
            registry,
            schema: None,
            recursion_depth: 0,
        }
    }

    /// Resolve computed fields (e.g. `duration`) through `schema` before
    /// dispatching clauses to the registry.
    pub fn with_schema(mut self, schema: &'a dyn Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Parse filter text. Empty or whitespace-only input means "no filter".
    pub fn parse(&mut self, input: &str) -> Result<Option<Expr>> {
        self.recursion_depth = 0;

        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let expr = self.parse_or(input)?;
        debug!(filter = input, expr = %expr, "parsed filter");
        Ok(Some(expr))
    }

    fn check_recursion_depth(&mut self) -> Result<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            return Err(Error::TooDeeplyNested(MAX_RECURSION_DEPTH));
        }
        Ok(())
    }

    fn decrement_recursion_depth(&mut self) {
        self.recursion_depth -= 1;
    }

    fn parse_or(&mut self, input: &str) -> Result<Expr> {
        let parts = split_on_logical(input, LogicalOperator::Or);
        if parts.len() == 1 {
            return self.parse_and(input);
        }

        let operands = parts
            .into_iter()
            .map(|part| self.parse_and(part))
            .collect::<Result<Vec<_>>>()?;
        Ok(Expr::Or { operands })
    }

    fn parse_and(&mut self, input: &str) -> Result<Expr> {
        let parts = split_on_logical(input, LogicalOperator::And);
        if parts.len() == 1 {
            return self.parse_primary(input);
        }

        let operands = parts
            .into_iter()
            .map(|part| self.parse_primary(part))
            .collect::<Result<Vec<_>>>()?;
        Ok(Expr::And { operands })
    }

    fn parse_primary(&mut self, input: &str) -> Result<Expr> {
        let input = input.trim();
        if !is_wrapped_in_parens(input) {
            return self.parse_clause(input);
        }

        let inner = input[1..input.len() - 1].trim();
        if inner.is_empty() {
            return Err(Error::EmptyGroup(input.to_string()));
        }

        self.check_recursion_depth()?;
        let expr = self.parse_or(inner)?;
        self.decrement_recursion_depth();
        Ok(expr)
    }

    /// Parse a single `field op value` clause.
    fn parse_clause(&self, clause: &str) -> Result<Expr> {
        let parsed = split_clause(clause)
            .filter(|c| is_field_name(c.field))
            .ok_or_else(|| Error::InvalidFilterClause(clause.to_string()))?;

        if let Some(schema) = self.schema {
            let version = schema.default_version();
            if let Some(expr) = schema.computed_field_expression(parsed.field, version) {
                return Ok(build_comparison(expr, parsed.operator, parsed.value));
            }
        }

        self.registry
            .resolve(parsed.field)
            .parse(parsed.field, parsed.operator, parsed.value)
    }
}

/// True when the first `(` closes exactly at the last byte, so
/// `(a = 1) and (b = 2)` is not treated as one group.
fn is_wrapped_in_parens(input: &str) -> bool {
    if !(input.starts_with('(') && input.ends_with(')')) {
        return false;
    }

    let quoted = quoted_mask(input);
    let mut depth = 0i32;
    let last = input.len() - 1;
    for (i, b) in input.bytes().enumerate() {
        if quoted[i] {
            continue;
        }
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i == last;
                }
            }
            _ => {}
        }
    }
    false
}

fn is_field_name(field: &str) -> bool {
    !field.is_empty()
        && !field
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"'))
}

/// Parse filter text with the default field registry.
pub fn parse_filter(input: &str) -> Result<Option<Expr>> {
    let registry = FieldRegistry::new();
    FilterParser::new(&registry).parse(input)
}

/// Parse filter text with the default field registry, expanding computed
/// fields defined by `schema`.
pub fn parse_filter_with_schema(input: &str, schema: &dyn Schema) -> Result<Option<Expr>> {
    let registry = FieldRegistry::new();
    FilterParser::new(&registry).with_schema(schema).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vpc_flow_logs::VpcFlowLogsSchema;

    fn parse(input: &str) -> Result<Option<Expr>> {
        parse_filter(input)
    }

    #[test]
    fn test_empty_is_no_filter() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   \t ").unwrap(), None);
    }

    #[test]
    fn test_single_clause_has_no_wrapper() {
        let expr = parse("dstport = 443").unwrap().unwrap();
        assert_eq!(expr, Expr::eq("dstport", 443));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("a=1 or b=2 and c=3").unwrap().unwrap();
        assert_eq!(
            expr,
            Expr::or(vec![
                Expr::eq("a", "1"),
                Expr::and(vec![Expr::eq("b", "2"), Expr::eq("c", "3")]),
            ])
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse("(a = 1 or b = 2) and c = 3").unwrap().unwrap();
        assert_eq!(
            expr,
            Expr::and(vec![
                Expr::or(vec![Expr::eq("a", "1"), Expr::eq("b", "2")]),
                Expr::eq("c", "3"),
            ])
        );
    }

    #[test]
    fn test_sibling_groups_are_not_one_group() {
        assert!(!is_wrapped_in_parens("(a = 1) x (b = 2)"));
        assert!(is_wrapped_in_parens("((a = 1) and (b = 2))"));
        assert!(is_wrapped_in_parens("(action = ')')"));
        assert!(is_wrapped_in_parens("(action = it's)"));
        assert!(!is_wrapped_in_parens("(a = o'x) and (b = 1)"));
    }

    #[test]
    fn test_empty_group() {
        assert!(matches!(parse("()"), Err(Error::EmptyGroup(_))));
    }

    #[test]
    fn test_missing_operator() {
        assert_eq!(
            parse("srcaddr"),
            Err(Error::InvalidFilterClause("srcaddr".into()))
        );
    }

    #[test]
    fn test_missing_field() {
        assert_eq!(
            parse("= 5"),
            Err(Error::InvalidFilterClause("= 5".into()))
        );
    }

    #[test]
    fn test_recursion_limit() {
        let deep = format!("{}a = 1{}", "(".repeat(250), ")".repeat(250));
        assert_eq!(parse(&deep), Err(Error::TooDeeplyNested(MAX_RECURSION_DEPTH)));

        let shallow = format!("{}a = 1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse(&shallow).unwrap(), Some(Expr::eq("a", "1")));
    }

    #[test]
    fn test_computed_field_with_schema() {
        let schema = VpcFlowLogsSchema::new();
        let expr = parse_filter_with_schema("duration > 300", &schema)
            .unwrap()
            .unwrap();
        assert_eq!(expr, Expr::gt("end - start", 300));
        assert_eq!(expr.to_string(), "(end - start) > 300");
    }

    #[test]
    fn test_computed_field_without_schema() {
        let expr = parse("duration > 300").unwrap().unwrap();
        assert_eq!(expr, Expr::gt("duration", 300));
    }
}
