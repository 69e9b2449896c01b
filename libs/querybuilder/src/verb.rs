//! Query verbs
//!
//! A verb is either an aggregation (`count`, `sum`, `avg`, `min`, `max`) or
//! `raw`, which returns log entries without aggregating them.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    #[default]
    Raw,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Raw,
        Verb::Count,
        Verb::Sum,
        Verb::Avg,
        Verb::Min,
        Verb::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Raw => "raw",
            Verb::Count => "count",
            Verb::Sum => "sum",
            Verb::Avg => "avg",
            Verb::Min => "min",
            Verb::Max => "max",
        }
    }

    /// The `stats` function for an aggregation verb; `None` for raw.
    pub fn stat_fn(&self) -> Option<&'static str> {
        match self {
            Verb::Raw => None,
            other => Some(other.as_str()),
        }
    }

    /// Every aggregation except `count` needs a numeric field.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, Verb::Sum | Verb::Avg | Verb::Min | Verb::Max)
    }
}

impl FromStr for Verb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        Verb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == lower)
            .ok_or_else(|| Error::UnknownVerb(s.to_string()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("COUNT".parse::<Verb>().unwrap(), Verb::Count);
        assert_eq!("Raw".parse::<Verb>().unwrap(), Verb::Raw);
        assert_eq!("avg".parse::<Verb>().unwrap(), Verb::Avg);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "median".parse::<Verb>(),
            Err(Error::UnknownVerb("median".into()))
        );
    }

    #[test]
    fn test_stat_fn() {
        assert_eq!(Verb::Raw.stat_fn(), None);
        assert_eq!(Verb::Max.stat_fn(), Some("max"));
        assert!(!Verb::Count.requires_numeric());
        assert!(Verb::Sum.requires_numeric());
    }
}
