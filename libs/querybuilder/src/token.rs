//! Operator tokens for the filter DSL
//!
//! Comparison operators appear inside a single clause (`field op value`),
//! logical operators join clauses (`clause and clause or clause`).

use std::fmt;

/// Comparison operator of a filter clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,      // =
    Neq,     // !=
    Gt,      // >
    Lt,      // <
    Gte,     // >=
    Lte,     // <=
    Like,    // like
    NotLike, // not like
}

impl Operator {
    /// Scan order for locating an operator inside a clause.
    ///
    /// Longer tokens come before the shorter tokens they contain, so `>=` is
    /// found before `>` and `!=` before `=`.
    pub const SCAN_ORDER: [Operator; 8] = [
        Operator::Neq,
        Operator::NotLike,
        Operator::Gte,
        Operator::Lte,
        Operator::Gt,
        Operator::Lt,
        Operator::Eq,
        Operator::Like,
    ];

    /// Equality and pattern operators, accepted by every field class.
    pub const EQUALITY: &'static [Operator] = &[
        Operator::Eq,
        Operator::Neq,
        Operator::Like,
        Operator::NotLike,
    ];

    /// Equality and ordering operators, accepted by numeric-like classes.
    pub const ORDERING: &'static [Operator] = &[
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
        }
    }

    /// Whether this operator negates its positive counterpart.
    pub fn is_negated(&self) -> bool {
        matches!(self, Operator::Neq | Operator::NotLike)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical operator joining filter operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And => "and",
            LogicalOperator::Or => "or",
        }
    }
}
