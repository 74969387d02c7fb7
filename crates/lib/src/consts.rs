/// Application name used for configuration directories.
pub const APP_NAME: &str = "anvil-manifest";

/// Configuration file name within the configuration directory.
pub const CONFIG_FILENAME: &str = "config.json";
