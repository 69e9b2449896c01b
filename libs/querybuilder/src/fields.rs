//! Field type registry
//!
//! Maps field names to a field class (ip, port, protocol, numeric). A class
//! decides which operators a clause may use, validates the raw value and
//! builds the typed [`Expr`] leaf. Fields absent from the registry fall back
//! to the generic string class.
//!
//! The registry is an ordinary value: build one with [`FieldRegistry::new`],
//! extend it with [`FieldRegistry::register_field`] and hand it to a
//! [`crate::parser::FilterParser`]. Nothing here is global.

use crate::ast::{Expr, Value};
use crate::error::{Error, Result};
use crate::token::Operator;
use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

pub const MIN_PORT: i64 = 0;
pub const MAX_PORT: i64 = 65535;
const MAX_IP_OCTET: u32 = 255;
const MAX_IP_PARTS: usize = 4;

pub const IP_FIELDS: &[&str] = &["srcaddr", "dstaddr", "pkt_srcaddr", "pkt_dstaddr"];
pub const PORT_FIELDS: &[&str] = &["srcport", "dstport"];
pub const PROTOCOL_FIELDS: &[&str] = &["protocol"];
pub const NUMERIC_FIELDS: &[&str] = &["packets", "bytes", "start", "end", "duration"];

/// IANA protocol numbers for the acronyms accepted in `protocol` clauses
static PROTOCOL_NUMBERS: phf::Map<&'static str, &'static str> = phf_map! {
    "tcp" => "6",
    "udp" => "17",
    "icmp" => "1",
    "icmpv6" => "58",
    "esp" => "50",
    "ah" => "51",
};

static IP_PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{1,3}(\.[0-9]{1,3}){0,3}$").expect("IP prefix pattern is valid")
});

/// Checks a raw clause value before it is parsed
pub type ValueValidator = fn(&str) -> Result<()>;

/// Builds the expression for `field operator value`
pub type FieldParser = fn(&str, Operator, &str) -> Result<Expr>;

/// A field class and its parsing rules
#[derive(Clone, Copy)]
pub struct FieldType {
    pub name: &'static str,
    pub supported_ops: &'static [Operator],
    pub value_validator: Option<ValueValidator>,
    pub parser: FieldParser,
}

impl FieldType {
    pub const IP: FieldType = FieldType {
        name: "ip",
        supported_ops: Operator::EQUALITY,
        value_validator: None,
        parser: parse_ip_field_expr,
    };

    pub const PORT: FieldType = FieldType {
        name: "port",
        supported_ops: Operator::ORDERING,
        value_validator: Some(validate_port),
        parser: parse_port_field_expr,
    };

    pub const PROTOCOL: FieldType = FieldType {
        name: "protocol",
        supported_ops: Operator::ORDERING,
        value_validator: None,
        parser: parse_protocol_field_expr,
    };

    pub const NUMERIC: FieldType = FieldType {
        name: "numeric",
        supported_ops: Operator::ORDERING,
        value_validator: None,
        parser: parse_numeric_field_expr,
    };

    /// Class used for every field that is not registered
    pub const GENERIC: FieldType = FieldType {
        name: "string",
        supported_ops: Operator::EQUALITY,
        value_validator: None,
        parser: parse_generic_field_expr,
    };

    pub fn supports(&self, op: Operator) -> bool {
        self.supported_ops.contains(&op)
    }

    /// Check the operator, run the value validator, then build the leaf.
    pub fn parse(&self, field: &str, op: Operator, value: &str) -> Result<Expr> {
        if !self.supports(op) {
            return Err(Error::UnsupportedOperator {
                class: self.name.to_string(),
                operator: op.as_str().to_string(),
            });
        }
        if let Some(validate) = self.value_validator {
            validate(value)?;
        }
        (self.parser)(field, op, value)
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldType")
            .field("name", &self.name)
            .field("supported_ops", &self.supported_ops)
            .field("has_validator", &self.value_validator.is_some())
            .finish()
    }
}

/// Field name -> field class lookup
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: HashMap<String, FieldType>,
}

impl FieldRegistry {
    /// Registry with the flow log field classes registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        let defaults: [(&[&str], FieldType); 4] = [
            (IP_FIELDS, FieldType::IP),
            (PORT_FIELDS, FieldType::PORT),
            (PROTOCOL_FIELDS, FieldType::PROTOCOL),
            (NUMERIC_FIELDS, FieldType::NUMERIC),
        ];
        for (names, field_type) in defaults {
            for name in names {
                registry.register_field(*name, field_type);
            }
        }

        registry
    }

    /// Registry where every field is generic.
    pub fn empty() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    pub fn field_type(&self, field: &str) -> Option<&FieldType> {
        self.fields.get(field)
    }

    /// Registered class for `field`, or the generic class.
    pub fn resolve(&self, field: &str) -> &FieldType {
        self.fields.get(field).unwrap_or(&FieldType::GENERIC)
    }

    pub fn register_field(&mut self, field: impl Into<String>, field_type: FieldType) {
        self.fields.insert(field.into(), field_type);
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a leaf for any operator.
///
/// Ordering and equality operators get a coerced value (integer, float or
/// string); `like` / `not like` keep the raw text as the pattern.
pub fn build_comparison(field: &str, op: Operator, raw: &str) -> Expr {
    let field = field.to_string();
    match op {
        Operator::Eq => Expr::Eq {
            field,
            value: Value::coerce(raw),
        },
        Operator::Neq => Expr::Neq {
            field,
            value: Value::coerce(raw),
        },
        Operator::Gt => Expr::Gt {
            field,
            value: Value::coerce(raw),
        },
        Operator::Lt => Expr::Lt {
            field,
            value: Value::coerce(raw),
        },
        Operator::Gte => Expr::Gte {
            field,
            value: Value::coerce(raw),
        },
        Operator::Lte => Expr::Lte {
            field,
            value: Value::coerce(raw),
        },
        Operator::Like => Expr::Like {
            field,
            pattern: raw.to_string(),
        },
        Operator::NotLike => Expr::NotLike {
            field,
            pattern: raw.to_string(),
        },
    }
}

fn validate_port(value: &str) -> Result<()> {
    let port: i64 = value
        .parse()
        .map_err(|_| Error::InvalidPortValue(value.to_string()))?;
    if !(MIN_PORT..=MAX_PORT).contains(&port) {
        return Err(Error::PortOutOfRange(port));
    }
    Ok(())
}

fn parse_port_field_expr(field: &str, op: Operator, value: &str) -> Result<Expr> {
    validate_port(value)?;
    Ok(build_comparison(field, op, value))
}

fn parse_numeric_field_expr(field: &str, op: Operator, value: &str) -> Result<Expr> {
    if Value::parse_number(value).is_none() {
        return Err(Error::InvalidNumericValue {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(build_comparison(field, op, value))
}

/// Numbers pass through, known acronyms become their protocol number and
/// anything else stays a literal so custom protocol values still work.
fn parse_protocol_field_expr(field: &str, op: Operator, value: &str) -> Result<Expr> {
    if let Ok(num) = value.parse::<i64>() {
        return Ok(build_comparison(field, op, &num.to_string()));
    }
    if let Some(number) = PROTOCOL_NUMBERS.get(value.to_ascii_lowercase().as_str()) {
        return Ok(build_comparison(field, op, number));
    }
    Ok(build_comparison(field, op, value))
}

fn parse_generic_field_expr(field: &str, op: Operator, value: &str) -> Result<Expr> {
    let field = field.to_string();
    let expr = match op {
        Operator::Eq => Expr::Eq {
            field,
            value: Value::String(value.to_string()),
        },
        Operator::Neq => Expr::Neq {
            field,
            value: Value::String(value.to_string()),
        },
        Operator::Like => Expr::Like {
            field,
            pattern: value.to_string(),
        },
        Operator::NotLike => Expr::NotLike {
            field,
            pattern: value.to_string(),
        },
        other => {
            return Err(Error::UnsupportedOperator {
                class: FieldType::GENERIC.name.to_string(),
                operator: other.as_str().to_string(),
            })
        }
    };
    Ok(expr)
}

/// Dispatch on the shape of the value: CIDR block, full address, or a
/// dotted octet prefix.
fn parse_ip_field_expr(field: &str, op: Operator, value: &str) -> Result<Expr> {
    if !Operator::EQUALITY.contains(&op) {
        return Err(Error::UnsupportedOperator {
            class: "IP".to_string(),
            operator: op.as_str().to_string(),
        });
    }

    if value.contains('/') {
        validate_cidr(value)?;
        let subnet = Expr::in_subnet(field, value);
        return Ok(if op.is_negated() {
            Expr::not(subnet)
        } else {
            subnet
        });
    }

    // A full address has nothing to pattern-match, so `like` is equality.
    if value.parse::<IpAddr>().is_ok() {
        return Ok(if op.is_negated() {
            Expr::neq(field, value)
        } else {
            Expr::eq(field, value)
        });
    }

    if is_valid_ip_prefix(value) {
        return Ok(if op.is_negated() {
            Expr::not_like(field, value)
        } else {
            Expr::like(field, value)
        });
    }

    Err(Error::InvalidIpValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn validate_cidr(value: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidCidrBlock(format!("{:?}: {}", value, reason));

    let (addr, bits) = value
        .split_once('/')
        .ok_or_else(|| invalid("missing prefix length"))?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid("invalid address"))?;
    if bits.is_empty() || !bits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("invalid prefix length"));
    }
    let bits: u32 = bits.parse().map_err(|_| invalid("invalid prefix length"))?;
    let max_bits = if addr.is_ipv4() { 32 } else { 128 };
    if bits > max_bits {
        return Err(invalid("prefix length out of range"));
    }
    Ok(())
}

fn is_valid_ip_prefix(prefix: &str) -> bool {
    if !IP_PREFIX_PATTERN.is_match(prefix) {
        return false;
    }
    let parts: Vec<&str> = prefix.split('.').collect();
    parts.len() <= MAX_IP_PARTS
        && parts
            .iter()
            .all(|part| matches!(part.parse::<u32>(), Ok(n) if n <= MAX_IP_OCTET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registrations() {
        let registry = FieldRegistry::new();
        assert_eq!(registry.field_type("srcaddr").unwrap().name, "ip");
        assert_eq!(registry.field_type("dstport").unwrap().name, "port");
        assert_eq!(registry.field_type("protocol").unwrap().name, "protocol");
        assert_eq!(registry.field_type("duration").unwrap().name, "numeric");
        assert!(registry.field_type("action").is_none());
        assert_eq!(registry.resolve("action").name, "string");
    }

    #[test]
    fn test_register_custom_field() {
        let mut registry = FieldRegistry::empty();
        registry.register_field("my_port", FieldType::PORT);
        assert_eq!(registry.resolve("my_port").name, "port");
        assert_eq!(registry.resolve("srcaddr").name, "string");
    }

    #[test]
    fn test_ip_prefix_rules() {
        assert!(is_valid_ip_prefix("10"));
        assert!(is_valid_ip_prefix("10.0.1"));
        assert!(!is_valid_ip_prefix("10.0.256"));
        assert!(!is_valid_ip_prefix("10..1"));
        assert!(!is_valid_ip_prefix("1.2.3.4.5"));
        assert!(!is_valid_ip_prefix("abc"));
    }

    #[test]
    fn test_cidr_validation() {
        assert!(validate_cidr("10.0.0.0/8").is_ok());
        assert!(validate_cidr("2001:db8::/32").is_ok());
        assert!(validate_cidr("10.0.0.0/33").is_err());
        assert!(validate_cidr("10.0.0/24").is_err());
        assert!(validate_cidr("10.0.0.0/").is_err());
        assert!(validate_cidr("10.0.0.0/+8").is_err());
    }

    #[test]
    fn test_unsupported_operator_names_class() {
        let err = FieldType::PORT.parse("srcport", Operator::Like, "80").unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedOperator {
                class: "port".into(),
                operator: "like".into()
            }
        );
    }
}
