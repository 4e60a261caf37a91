//! Server-provided display defaults, merged over hardcoded ones.
//!
//! [`ConfigurationSnapshot`] is built once at startup by [`load_config`] and
//! never mutated.  Every field is taken from `GET /api/config` when present
//! and well-formed, otherwise the hardcoded default is kept.  Loading never
//! fails: problems are logged and the defaults win.

use serde_json::Value;

use crate::api::{AudioFormat, SynthesisBackend};
use crate::config::Theme;

/// Maximum length of the style prompt, in characters.
pub const MAX_STYLE_PROMPT_CHARS: usize = 200;

/// Immutable defaults for the synthesis form.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationSnapshot {
    pub theme: Theme,
    pub style_prompt: String,
    pub audio_format: AudioFormat,
    pub temperature: f32,
    pub chunk_size_chars: u32,
    pub api_timeout_seconds: u32,
    pub default_voice: String,
    pub max_text_chars: usize,
}

impl Default for ConfigurationSnapshot {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            style_prompt: "Read aloud in a warm and friendly tone:".into(),
            audio_format: AudioFormat::Wav,
            temperature: 1.0,
            chunk_size_chars: 1500,
            api_timeout_seconds: 60,
            default_voice: "Fenrir".into(),
            max_text_chars: 20_000,
        }
    }
}

impl ConfigurationSnapshot {
    /// Overlay the fields of a `/api/config` JSON object on the defaults.
    ///
    /// Missing, mistyped and out-of-range fields keep their default.  A
    /// non-object `value` yields the defaults unchanged.
    pub fn merged(value: &Value) -> Self {
        let mut snapshot = Self::default();

        if !value.is_object() {
            log::warn!("config: server config is not a JSON object; using defaults");
            return snapshot;
        }

        if let Some(theme) = str_field(value, "default_theme").and_then(Theme::parse) {
            snapshot.theme = theme;
        }
        if let Some(prompt) = str_field(value, "default_style_prompt") {
            snapshot.style_prompt = prompt.chars().take(MAX_STYLE_PROMPT_CHARS).collect();
        }
        if let Some(format) = str_field(value, "default_audio_format").and_then(|s| s.parse().ok()) {
            snapshot.audio_format = format;
        }
        if let Some(t) = value.get("default_temperature").and_then(Value::as_f64) {
            if t.is_finite() && t >= 0.0 {
                snapshot.temperature = t as f32;
            }
        }
        if let Some(n) = positive_u32(value, "default_chunk_size_chars") {
            snapshot.chunk_size_chars = n;
        }
        if let Some(n) = positive_u32(value, "default_api_timeout_seconds") {
            snapshot.api_timeout_seconds = n;
        }
        if let Some(name) = str_field(value, "default_voice_display_name").filter(|s| !s.is_empty()) {
            snapshot.default_voice = name.to_string();
        }
        if let Some(n) = positive_u32(value, "default_max_text_chars") {
            snapshot.max_text_chars = n as usize;
        }

        snapshot
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn positive_u32(value: &Value, key: &str) -> Option<u32> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
}

/// Fetch `GET /api/config` once and merge it over the defaults.
///
/// Best-effort: any failure is logged and the hardcoded defaults are
/// returned.  No retries.
pub async fn load_config(backend: &dyn SynthesisBackend) -> ConfigurationSnapshot {
    match backend.fetch_config().await {
        Ok(value) => {
            let snapshot = ConfigurationSnapshot::merged(&value);
            log::info!(
                "config: loaded server defaults (voice={}, format={}, chunk={})",
                snapshot.default_voice,
                snapshot.audio_format,
                snapshot.chunk_size_chars
            );
            snapshot
        }
        Err(e) => {
            log::warn!("config: error loading server config ({e}); using defaults");
            ConfigurationSnapshot::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_server_defaults() {
        let cfg = ConfigurationSnapshot::default();
        assert_eq!(cfg.theme, Theme::Dark);
        assert_eq!(cfg.audio_format, AudioFormat::Wav);
        assert_eq!(cfg.chunk_size_chars, 1500);
        assert_eq!(cfg.api_timeout_seconds, 60);
        assert_eq!(cfg.default_voice, "Fenrir");
        assert_eq!(cfg.max_text_chars, 20_000);
    }

    #[test]
    fn full_object_overrides_every_field() {
        let value = json!({
            "default_theme": "light",
            "default_style_prompt": "Whisper:",
            "default_audio_format": "flac",
            "default_temperature": 0.5,
            "default_chunk_size_chars": 800,
            "default_api_timeout_seconds": 120,
            "default_voice_display_name": "Kore",
            "default_max_text_chars": 5000
        });
        let cfg = ConfigurationSnapshot::merged(&value);
        assert_eq!(cfg.theme, Theme::Light);
        assert_eq!(cfg.style_prompt, "Whisper:");
        assert_eq!(cfg.audio_format, AudioFormat::Flac);
        assert!((cfg.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(cfg.chunk_size_chars, 800);
        assert_eq!(cfg.api_timeout_seconds, 120);
        assert_eq!(cfg.default_voice, "Kore");
        assert_eq!(cfg.max_text_chars, 5000);
    }

    #[test]
    fn missing_and_malformed_fields_keep_defaults() {
        let value = json!({
            "default_theme": "sepia",
            "default_audio_format": "ogg",
            "default_chunk_size_chars": 0,
            "default_api_timeout_seconds": "sixty",
            "default_voice_display_name": "Puck"
        });
        let cfg = ConfigurationSnapshot::merged(&value);
        let default = ConfigurationSnapshot::default();
        assert_eq!(cfg.theme, default.theme);
        assert_eq!(cfg.audio_format, default.audio_format);
        assert_eq!(cfg.chunk_size_chars, default.chunk_size_chars);
        assert_eq!(cfg.api_timeout_seconds, default.api_timeout_seconds);
        assert_eq!(cfg.style_prompt, default.style_prompt);
        assert_eq!(cfg.default_voice, "Puck");
    }

    #[test]
    fn non_object_yields_defaults() {
        assert_eq!(
            ConfigurationSnapshot::merged(&json!(["nope"])),
            ConfigurationSnapshot::default()
        );
    }

    #[test]
    fn long_style_prompt_is_truncated() {
        let long = "a".repeat(MAX_STYLE_PROMPT_CHARS + 50);
        let cfg = ConfigurationSnapshot::merged(&json!({ "default_style_prompt": long }));
        assert_eq!(cfg.style_prompt.chars().count(), MAX_STYLE_PROMPT_CHARS);
    }

    #[tokio::test]
    async fn load_config_merges_server_values() {
        use crate::testing::MockBackend;

        let backend = MockBackend::new().with_config(Ok(json!({
            "default_voice_display_name": "Kore",
            "default_api_timeout_seconds": 120
        })));
        let cfg = load_config(&backend).await;
        assert_eq!(cfg.default_voice, "Kore");
        assert_eq!(cfg.api_timeout_seconds, 120);
    }

    #[tokio::test]
    async fn load_config_failure_returns_defaults() {
        use crate::api::ApiError;
        use crate::testing::MockBackend;

        let backend =
            MockBackend::new().with_config(Err(ApiError::Network("connection refused".into())));
        assert_eq!(load_config(&backend).await, ConfigurationSnapshot::default());
    }
}
