//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\tts-desk\
//!   macOS:   ~/Library/Application Support/tts-desk/
//!   Linux:   ~/.config/tts-desk/
//!
//! Downloads (saved audio): the platform download directory, falling back to
//! the home directory.

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Where synthesized audio is saved by default.
    pub downloads_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "tts-desk";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let downloads_dir = dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            downloads_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
