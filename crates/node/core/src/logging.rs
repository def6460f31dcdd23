//! Logging configuration for the hearth node.

use eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, LevelFilter};

use crate::config::NodeConfig;
use crate::constants::MAX_VERBOSITY;

/// A `vmodule` entry that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogDirectiveError {
    #[error("expected module=level, got {0:?}")]
    Malformed(String),
    #[error("level {level} for {module} out of range 0..=5")]
    Level { module: String, level: String },
}

/// Map a verbosity level to a level filter. `0` silences everything.
pub fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Parse a comma-separated `module=level` list.
pub fn parse_vmodule(vmodule: &str) -> Result<Vec<(String, LevelFilter)>, LogDirectiveError> {
    vmodule
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (module, level) = entry
                .split_once('=')
                .filter(|(m, _)| !m.trim().is_empty())
                .ok_or_else(|| LogDirectiveError::Malformed(entry.to_string()))?;
            let module = module.trim().to_string();
            let level = level.trim();
            match level.parse::<u8>() {
                Ok(v) if v <= MAX_VERBOSITY => Ok((module, verbosity_level(v))),
                _ => Err(LogDirectiveError::Level {
                    module,
                    level: level.to_string(),
                }),
            }
        })
        .collect()
}

/// Build the log filter from a verbosity level and `vmodule` overrides.
pub fn build_filter(verbosity: u8, vmodule: &str) -> Result<EnvFilter, LogDirectiveError> {
    let mut filter = EnvFilter::default().add_directive(verbosity_level(verbosity).into());
    for (module, level) in parse_vmodule(vmodule)? {
        let directive: Directive = format!("{module}={level}")
            .parse()
            .map_err(|_| LogDirectiveError::Malformed(module.clone()))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

/// Initialise the global subscriber. `RUST_LOG`, when set, replaces the
/// filter built from the configuration.
pub fn init_logging(config: &NodeConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(config.verbosity, &config.vmodule)?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if config.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| eyre!(e))
}
