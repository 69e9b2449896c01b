//! YAML query collections
//!
//! ```yaml
//! queries:
//!   - name: rejected-ssh
//!     description: Rejected SSH attempts by source
//!     tags: [security]
//!     config:
//!       verb: count
//!       filter: dstport = 22 and action = REJECT
//!       by: srcaddr
//!       limit: 10
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One query request, as stored in a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub verb: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Comma separated group-by fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// A query with descriptive metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub config: QueryConfig,
}

impl NamedQuery {
    /// Name for messages: the configured name or the 1-based position.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("query #{}", index + 1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryCollection {
    pub queries: Vec<NamedQuery>,
}

impl QueryCollection {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("failed to parse query collection")
    }

    /// Read a collection from a file, or from stdin when `path` is `-`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = if path == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read query collection from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?
        };
        Self::from_yaml(&yaml)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).context("failed to serialize query collection")
    }
}
