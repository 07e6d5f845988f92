//! Configuration loading, validation and env substitution.
//!
//! Config files: `pixelbot.toml`, `pixelbot.yaml`, `pixelbot.yml` or
//! `pixelbot.json`, searched in `./` then `~/.config/pixelbot/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, find_config_file, load_config},
    schema::{
        BotConfig, BotKind, BridgeConfig, ContentConfig, DeviceConfig, PixelbotConfig,
        PlayerConfig, ServerConfig, TelegramConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_config},
};
