//! Configuration loading for postdesk.
//!
//! Config files: `postdesk.toml` or `postdesk.json`, searched in `./` then
//! `~/.config/postdesk/`. `${ENV_VAR}` placeholders in the raw file are
//! substituted before parsing.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_and_load, load_config},
    schema::{PostdeskConfig, ReportConfig, TelegramConfig},
};
