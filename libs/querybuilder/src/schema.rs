//! Log schema abstraction
//!
//! A schema describes one log format: which versions exist, which fields each
//! version carries, how raw messages are parsed into fields, and which fields
//! are computed from others. The builder and the filter parser only talk to
//! this trait.

use crate::error::Result;

/// Field catalog and query components for one log format
pub trait Schema: Send + Sync {
    /// The `parse @message ...` statement for `version`.
    ///
    /// Must fail for unsupported versions rather than fall back to another
    /// version's pattern.
    fn parse_pattern(&self, version: u32) -> Result<&str>;

    /// Check that `field` exists in `version`. The wildcard `*` and computed
    /// fields are always valid.
    fn validate_field(&self, field: &str, version: u32) -> Result<()>;

    fn validate_version(&self, version: u32) -> Result<()>;

    fn default_version(&self) -> u32;

    /// Whether `field` holds numbers (and can be summed, averaged, ...).
    fn is_numeric(&self, field: &str) -> bool;

    /// Expression a computed field expands to, e.g. `end - start`.
    ///
    /// `None` means the field is physical and is used by name.
    fn computed_field_expression(&self, field: &str, version: u32) -> Option<&str>;
}
