//! Local settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! The only user state persisted here is the theme preference; everything
//! else describes how to reach the server.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Colour scheme of the front-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Parse the server's `"light"` / `"dark"` strings; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// How to reach the synthesis server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Seconds allowed for establishing a connection.
    pub connect_timeout_secs: u64,
    /// Per-request deadline for the config, voices and cancel endpoints.
    /// Synthesis itself is bounded by the server-side API timeout instead.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            connect_timeout_secs: 10,
            request_timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Front-end appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Saved theme preference.  `None` until the user toggles the theme, in
    /// which case the server's default theme applies.
    pub theme: Option<Theme>,
    /// Initial window size `(width, height)` in logical pixels.
    pub window_size: (f32, f32),
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: None,
            window_size: (560.0, 720.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level local configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use tts_desk::config::{AppConfig, Theme};
///
/// // Load (returns Default when file is missing)
/// let mut config = AppConfig::load().unwrap();
///
/// // Persist a theme toggle
/// config.ui.theme = Some(Theme::Light);
/// config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server connection settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// UI settings, including the persisted theme.
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The theme to apply at startup: the saved preference, else `fallback`
    /// (normally the server's default theme).
    pub fn effective_theme(&self, fallback: Theme) -> Theme {
        self.ui.theme.unwrap_or(fallback)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.server.base_url, loaded.server.base_url);
        assert_eq!(
            original.server.connect_timeout_secs,
            loaded.server.connect_timeout_secs
        );
        assert_eq!(original.ui.theme, loaded.ui.theme);
        assert_eq!(original.ui.window_size, loaded.ui.window_size);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.server.base_url, ServerConfig::default().base_url);
        assert!(config.ui.theme.is_none());
    }

    #[test]
    fn theme_toggle_is_persisted() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.ui.theme = Some(Theme::Light);
        cfg.save_to(&path).expect("save");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("theme = \"light\""));

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.ui.theme, Some(Theme::Light));
        assert_eq!(loaded.effective_theme(Theme::Dark), Theme::Light);
    }

    #[test]
    fn partial_file_fills_missing_sections() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[server]\nbase_url = \"http://tts.local:9000\"\nconnect_timeout_secs = 3\n",
        )
        .unwrap();

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.server.base_url, "http://tts.local:9000");
        assert_eq!(loaded.server.connect_timeout_secs, 3);
        assert_eq!(
            loaded.server.request_timeout_secs,
            ServerConfig::default().request_timeout_secs
        );
        assert!(loaded.ui.theme.is_none());
        assert_eq!(loaded.effective_theme(Theme::Dark), Theme::Dark);
    }

    #[test]
    fn ui_table_with_only_theme_loads() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("theme-only.toml");
        std::fs::write(&path, "[ui]\ntheme = \"light\"\n").unwrap();

        let loaded = AppConfig::load_from(&path).expect("load");
        assert_eq!(loaded.ui.theme, Some(Theme::Light));
        assert_eq!(loaded.ui.window_size, UiConfig::default().window_size);
    }

    #[test]
    fn theme_helpers() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::parse("LIGHT"), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
        assert_eq!(Theme::default(), Theme::Dark);
    }
}
