// =============================================================================
// Application Identity
// =============================================================================

/// Application name (binary name and identifiers)
pub const APP_NAME: &str = "dvfilter";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".dvfilter";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "dvfilter.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "DVFILTER_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "DVFILTER_LOG";

/// Environment variable for the maximum JSON body size
pub const ENV_MAX_BODY_BYTES: &str = "DVFILTER_MAX_BODY_BYTES";

/// Environment variable for the maximum expression nesting depth
pub const ENV_MAX_DEPTH: &str = "DVFILTER_MAX_DEPTH";

/// Environment variable for the maximum number of conditions per request
pub const ENV_MAX_CONDITIONS: &str = "DVFILTER_MAX_CONDITIONS";

// =============================================================================
// Filter Limits
// =============================================================================

/// Default maximum JSON filter body size (64 KiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Default maximum nesting depth of a JSON filter expression
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default maximum number of filter conditions per request
pub const DEFAULT_MAX_CONDITIONS: usize = 100;

// =============================================================================
// Query Dialect
// =============================================================================

/// Query keys owned by pagination and sorting, never parsed as filters
pub const RESERVED_QUERY_KEYS: &[&str] = &["offset", "limit", "sort", "order"];

/// Endpoint whose bare `name=` key defaults to `contains`
pub const SPACES_ENDPOINT: &str = "spaces";

/// Space used by the CLI when none is given
pub const DEFAULT_SPACE_ID: &str = "default";
