//! Node infrastructure library.
//!
//! - [`args`] - CLI argument structs, serialisable as configuration overrides
//! - [`config`] - Layered [`NodeConfig`](config::NodeConfig) loading and validation
//! - [`identity`] - Node key loading
//! - [`logging`] - Log filter construction and subscriber setup
//! - [`version`] - Version information

pub mod args;
pub mod config;
pub mod constants;
pub mod identity;
pub mod logging;
pub mod version;
