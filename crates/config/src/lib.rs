//! Configuration loading for the amoris gateway.
//!
//! A single optional `amoris.toml`, discovered project-local first and then
//! in `~/.config/amoris/`. `${ENV_VAR}` placeholders in the file are
//! substituted before parsing. Missing file means defaults.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{AmorisConfig, AuthSection, DatabaseSection, GatewaySection},
};
