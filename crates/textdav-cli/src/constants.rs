//! CLI configuration constants.

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "textdav.ron";

/// Authentication realm announced to clients.
pub const DEFAULT_REALM: &str = "textdav";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";
