//! VPC Flow Logs schema (record versions 2, 3 and 5)

use crate::error::{Error, Result};
use crate::schema::Schema;
use phf::phf_set;

pub const DEFAULT_VERSION: u32 = 2;

pub const PARSE_PATTERN_V2: &str = r#"parse @message "* * * * * * * * * * * * * *" as version, account_id, interface_id, srcaddr, dstaddr, srcport, dstport, protocol, packets, bytes, start, end, action, log_status"#;

pub const PARSE_PATTERN_V3: &str = r#"parse @message "* * * * * * * * * * * * * * * * * * * * * * * * * * * * * * *" as version, account_id, interface_id, srcaddr, dstaddr, srcport, dstport, protocol, packets, bytes, start, end, action, log_status, vpc_id, subnet_id, instance_id, tcp_flags, type, pkt_srcaddr, pkt_dstaddr, region, az_id, sublocation_type, sublocation_id, pkt_src_aws_service, pkt_dst_aws_service, flow_direction, traffic_path"#;

pub const PARSE_PATTERN_V5: &str = PARSE_PATTERN_V3;

const FIELDS_V2: &[&str] = &[
    "version",
    "account_id",
    "interface_id",
    "srcaddr",
    "dstaddr",
    "srcport",
    "dstport",
    "protocol",
    "packets",
    "bytes",
    "start",
    "end",
    "action",
    "log_status",
];

const FIELDS_V3: &[&str] = &[
    "version",
    "account_id",
    "interface_id",
    "srcaddr",
    "dstaddr",
    "srcport",
    "dstport",
    "protocol",
    "packets",
    "bytes",
    "start",
    "end",
    "action",
    "log_status",
    "vpc_id",
    "subnet_id",
    "instance_id",
    "tcp_flags",
    "type",
    "pkt_srcaddr",
    "pkt_dstaddr",
    "region",
    "az_id",
    "sublocation_type",
    "sublocation_id",
    "pkt_src_aws_service",
    "pkt_dst_aws_service",
    "flow_direction",
    "traffic_path",
];

const FIELDS_V5: &[&str] = FIELDS_V3;

static NUMERIC_FIELDS: phf::Set<&'static str> = phf_set! {
    "srcport",
    "dstport",
    "protocol",
    "packets",
    "bytes",
    "start",
    "end",
    "duration",
};

const DURATION_EXPRESSION: &str = "end - start";

/// Schema for AWS VPC Flow Logs in the default space-separated format
#[derive(Debug, Clone, Copy, Default)]
pub struct VpcFlowLogsSchema;

impl VpcFlowLogsSchema {
    pub fn new() -> Self {
        Self
    }

    /// Ordered field list for a version.
    pub fn fields(&self, version: u32) -> Result<&'static [&'static str]> {
        match version {
            2 => Ok(FIELDS_V2),
            3 => Ok(FIELDS_V3),
            5 => Ok(FIELDS_V5),
            other => Err(Error::UnsupportedVersion(other)),
        }
    }

    pub fn supported_versions(&self) -> &'static [u32] {
        &[2, 3, 5]
    }
}

impl Schema for VpcFlowLogsSchema {
    fn parse_pattern(&self, version: u32) -> Result<&str> {
        match version {
            2 => Ok(PARSE_PATTERN_V2),
            3 => Ok(PARSE_PATTERN_V3),
            5 => Ok(PARSE_PATTERN_V5),
            other => Err(Error::NoParsePattern(other)),
        }
    }

    fn validate_field(&self, field: &str, version: u32) -> Result<()> {
        if field == "*" || self.computed_field_expression(field, version).is_some() {
            return Ok(());
        }
        if self.fields(version)?.contains(&field) {
            return Ok(());
        }
        Err(Error::UnknownField {
            field: field.to_string(),
            version,
        })
    }

    fn validate_version(&self, version: u32) -> Result<()> {
        self.fields(version).map(|_| ())
    }

    fn default_version(&self) -> u32 {
        DEFAULT_VERSION
    }

    fn is_numeric(&self, field: &str) -> bool {
        NUMERIC_FIELDS.contains(field)
    }

    fn computed_field_expression(&self, field: &str, _version: u32) -> Option<&str> {
        match field {
            "duration" => Some(DURATION_EXPRESSION),
            _ => None,
        }
    }
}
