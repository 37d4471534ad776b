// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// `name/version`, used as the HTTP user agent and in the startup log.
pub fn user_agent() -> String {
    format!("{NAME}/{VERSION}")
}
