//! Typed configuration for the tgbridge plugin.
//!
//! The bridge is configured once at startup from a TOML file; nothing reads
//! config keys ad hoc at runtime. The file lives under the user config
//! directory and is written by the `tgbridge telegram` CLI subcommand.

pub mod loader;
pub mod schema;

pub use {
    loader::{config_path, data_dir, load_config, save_config, session_path},
    schema::{BridgeConfig, TelegramCredentials},
};
