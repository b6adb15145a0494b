/// Category label for feature units.
pub const FEATURE: &str = "feature";
/// Category label for data provider units.
pub const DATA: &str = "data";
/// Category label for environment entries.
pub const ENVIRONMENT: &str = "environment";
/// Placeholder label for dependency names that never resolved to a unit.
pub const UNKNOWN: &str = "unknown";

/// Default attribute prefix recognized by environment scanning.
pub const ENV_ATTR_PREFIX: &str = "data-env-";
