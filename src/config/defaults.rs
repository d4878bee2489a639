//! System-wide default constants.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address when neither config nor CLI sets one.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Maximum accepted request body (bytes). Detection batches dominate.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Per-request timeout (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "TANKWATCH_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tankwatch.toml";

// ============================================================================
// Storage
// ============================================================================

/// Sled database directory.
pub const SLED_PATH: &str = "./data/tankwatch.sled";
