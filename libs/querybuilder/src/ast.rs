//! Filter expression tree
//!
//! `Expr` is a closed set of comparison leaves and boolean combinators. Each
//! node renders itself as Logs Insights `filter` syntax through `Display`;
//! rendering is pure, so the same tree always produces the same text.
//!
//! # Rendering rules
//!
//! | Node | Output |
//! |------|--------|
//! | `Eq` .. `Lte` | `field op literal`, computed fields wrapped as `(end - start)` |
//! | `Like` / `NotLike` | `field like 'pattern'` |
//! | `IsIpv4InSubnet` | `isIpv4InSubnet(field, 'cidr')` |
//! | `And` | operands joined by ` and `, never parenthesized |
//! | `Or` | operands joined by ` or `, always parenthesized (even one operand) |
//! | `Not` | `not <inner>` |

use serde::Serialize;
use std::fmt;

/// A literal compared against a field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Parse `raw` as an integer, then as a finite float.
    pub fn parse_number(raw: &str) -> Option<Value> {
        if let Ok(n) = raw.parse::<i64>() {
            return Some(Value::Integer(n));
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Value::Float(f)),
            _ => None,
        }
    }

    /// Numeric when the text reads as a number, otherwise the text itself.
    pub fn coerce(raw: &str) -> Value {
        Self::parse_number(raw).unwrap_or_else(|| Value::String(raw.to_string()))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// The literal as it appears in a query: numbers bare, text single-quoted.
    ///
    /// Floats use `f64`'s `Display`, which never switches to exponent form,
    /// so `1e21` renders as `1000000000000000000000`.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => quote(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Filter expression node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Eq { field: String, value: Value },
    Neq { field: String, value: Value },
    Gt { field: String, value: Value },
    Lt { field: String, value: Value },
    Gte { field: String, value: Value },
    Lte { field: String, value: Value },
    Like { field: String, pattern: String },
    NotLike { field: String, pattern: String },
    /// CIDR membership, e.g. `isIpv4InSubnet(srcaddr, '10.0.0.0/24')`
    IsIpv4InSubnet { field: String, cidr: String },
    And { operands: Vec<Expr> },
    Or { operands: Vec<Expr> },
    Not { inner: Box<Expr> },
}

impl Expr {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn neq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Neq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Gte {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Lte {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Expr::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn not_like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Expr::NotLike {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn in_subnet(field: impl Into<String>, cidr: impl Into<String>) -> Self {
        Expr::IsIpv4InSubnet {
            field: field.into(),
            cidr: cidr.into(),
        }
    }

    pub fn and(operands: Vec<Expr>) -> Self {
        Expr::And { operands }
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Expr::Or { operands }
    }

    pub fn not(inner: Expr) -> Self {
        Expr::Not {
            inner: Box::new(inner),
        }
    }

    /// Field of a comparison leaf; `None` for combinators.
    pub fn field(&self) -> Option<&str> {
        match self {
            Expr::Eq { field, .. }
            | Expr::Neq { field, .. }
            | Expr::Gt { field, .. }
            | Expr::Lt { field, .. }
            | Expr::Gte { field, .. }
            | Expr::Lte { field, .. }
            | Expr::Like { field, .. }
            | Expr::NotLike { field, .. }
            | Expr::IsIpv4InSubnet { field, .. } => Some(field),
            Expr::And { .. } | Expr::Or { .. } | Expr::Not { .. } => None,
        }
    }

    /// Fields of every leaf in the tree, left to right.
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::And { operands } | Expr::Or { operands } => {
                for operand in operands {
                    operand.collect_fields(out);
                }
            }
            Expr::Not { inner } => inner.collect_fields(out),
            leaf => out.extend(leaf.field()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Eq { field, value } => write!(f, "{} = {}", format_field(field), value),
            Expr::Neq { field, value } => write!(f, "{} != {}", format_field(field), value),
            Expr::Gt { field, value } => write!(f, "{} > {}", format_field(field), value),
            Expr::Lt { field, value } => write!(f, "{} < {}", format_field(field), value),
            Expr::Gte { field, value } => write!(f, "{} >= {}", format_field(field), value),
            Expr::Lte { field, value } => write!(f, "{} <= {}", format_field(field), value),
            Expr::Like { field, pattern } => write!(f, "{} like {}", field, quote(pattern)),
            Expr::NotLike { field, pattern } => {
                write!(f, "{} not like {}", field, quote(pattern))
            }
            Expr::IsIpv4InSubnet { field, cidr } => {
                write!(f, "isIpv4InSubnet({}, '{}')", field, cidr)
            }
            Expr::And { operands } => write_joined(f, operands, " and "),
            Expr::Or { operands } => {
                if operands.is_empty() {
                    return Ok(());
                }
                f.write_str("(")?;
                write_joined(f, operands, " or ")?;
                f.write_str(")")
            }
            Expr::Not { inner } => write!(f, "not {}", inner),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, operands: &[Expr], sep: &str) -> fmt::Result {
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", operand)?;
    }
    Ok(())
}

/// Single-quote a string literal, backslash-escaping embedded single quotes.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "\\'"))
}

/// True when `field` is an expression (`end - start`) rather than a name.
pub fn is_computed_expression(field: &str) -> bool {
    field
        .chars()
        .any(|c| matches!(c, ' ' | '-' | '/' | '*' | '+' | '(' | ')'))
}

fn format_field(field: &str) -> std::borrow::Cow<'_, str> {
    if is_computed_expression(field) {
        format!("({})", field).into()
    } else {
        field.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_literals_unquoted() {
        assert_eq!(Expr::eq("dstport", 443).to_string(), "dstport = 443");
        assert_eq!(Expr::gt("bytes", 1.5).to_string(), "bytes > 1.5");
    }

    #[test]
    fn test_large_float_renders_without_exponent() {
        assert_eq!(Value::Float(1e21).to_literal(), "1000000000000000000000");
        assert_eq!(Value::Float(0.5).to_literal(), "0.5");
    }

    #[test]
    fn test_string_literal_escaping() {
        assert_eq!(
            Expr::eq("action", "it's").to_string(),
            "action = 'it\\'s'"
        );
    }

    #[test]
    fn test_computed_field_parenthesized() {
        assert_eq!(Expr::gt("end - start", 300).to_string(), "(end - start) > 300");
        assert_eq!(Expr::like("end - start", "1").to_string(), "end - start like '1'");
    }

    #[test]
    fn test_or_always_parenthesized() {
        let single = Expr::or(vec![Expr::eq("a", 1)]);
        assert_eq!(single.to_string(), "(a = 1)");
        assert_eq!(Expr::or(vec![]).to_string(), "");
    }

    #[test]
    fn test_and_never_parenthesized() {
        let and = Expr::and(vec![Expr::eq("a", 1), Expr::eq("b", 2)]);
        assert_eq!(and.to_string(), "a = 1 and b = 2");
        assert_eq!(Expr::and(vec![]).to_string(), "");
    }

    #[test]
    fn test_not_subnet() {
        let e = Expr::not(Expr::in_subnet("srcaddr", "10.0.0.0/24"));
        assert_eq!(e.to_string(), "not isIpv4InSubnet(srcaddr, '10.0.0.0/24')");
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(Value::coerce("42"), Value::Integer(42));
        assert_eq!(Value::coerce("4.5"), Value::Float(4.5));
        assert_eq!(Value::coerce("NaN"), Value::String("NaN".into()));
        assert_eq!(Value::coerce("eni-1"), Value::String("eni-1".into()));
    }

    #[test]
    fn test_fields_walk() {
        let e = Expr::or(vec![
            Expr::eq("a", 1),
            Expr::and(vec![Expr::eq("b", 2), Expr::not(Expr::eq("c", 3))]),
        ]);
        assert_eq!(e.fields(), vec!["a", "b", "c"]);
    }
}
