//! Configuration module for tts-desk.
//!
//! Provides `AppConfig` (local settings persisted as TOML), `AppPaths` for
//! cross-platform directories, and the server-provided
//! [`ConfigurationSnapshot`] loaded once at startup by [`load_config`].

pub mod paths;
pub mod settings;
pub mod snapshot;

pub use paths::AppPaths;
pub use settings::{AppConfig, ServerConfig, Theme, UiConfig};
pub use snapshot::{load_config, ConfigurationSnapshot, MAX_STYLE_PROMPT_CHARS};
