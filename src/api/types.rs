//! Wire types exchanged with the synthesis backend.
//!
//! Field names follow the JSON the server speaks (`snake_case`), so the
//! structs serialise without any renaming beyond the enum variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TaskId
// ---------------------------------------------------------------------------

/// Client-generated identifier of one synthesis task.
///
/// Sent in the synthesize body and used as the path segment of the
/// cancellation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// A fresh random (v4) task id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// AudioFormat
// ---------------------------------------------------------------------------

/// Output container requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Wav, AudioFormat::Mp3, AudioFormat::Flac];

    /// File extension used for downloads (no leading dot).
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        AudioFormat::Wav
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "flac" => Ok(AudioFormat::Flac),
            other => Err(format!("unsupported audio format: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Voices
// ---------------------------------------------------------------------------

/// One selectable voice as listed by `GET /api/voices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Voice {
    pub fn new(display_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: Some(description.into()),
        }
    }

    /// Label shown in the voice picker: `"Name (description)"`.
    pub fn label(&self) -> String {
        let description = self
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description");
        format!("{} ({})", self.display_name, description)
    }
}

/// Body of a successful `GET /api/voices`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceListResponse {
    #[serde(default)]
    pub voices: Option<Vec<Voice>>,
    #[serde(default)]
    pub default_voice: Option<String>,
}

// ---------------------------------------------------------------------------
// SynthesisRequest
// ---------------------------------------------------------------------------

/// Body of `POST /api/synthesize`.  Built by the controller once the
/// caller's parameters have been validated; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub task_id: TaskId,
    pub text: String,
    pub voice_name: String,
    pub audio_format: AudioFormat,
    pub temperature: f32,
    pub style_prompt: String,
    pub chunk_size_chars: u32,
    pub api_timeout_seconds: u32,
}

/// `{ "detail": "..." }` error body returned on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
