//! Version information for the hearth node.

/// The version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The git commit SHA, when provided at build time.
pub const GIT_SHA: &str = {
    match option_env!("HEARTH_GIT_SHA") {
        Some(sha) => sha,
        None => "unknown",
    }
};

/// Client name advertised in logs.
pub const CLIENT_VERSION: &str = concat!("hearth/v", env!("CARGO_PKG_VERSION"));

