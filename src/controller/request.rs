//! Submission parameters, their validation, and the produced artifact.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::api::{AudioFormat, SynthesisRequest, TaskId};
use crate::config::{ConfigurationSnapshot, MAX_STYLE_PROMPT_CHARS};
use crate::controller::error::ValidationFailure;
use crate::voices::VoiceCatalog;

// ---------------------------------------------------------------------------
// SynthesisParams
// ---------------------------------------------------------------------------

/// What the caller asks for.  The controller adds the task id and turns this
/// into a [`SynthesisRequest`] once it passes validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisParams {
    pub text: String,
    pub voice_name: Option<String>,
    pub audio_format: AudioFormat,
    pub temperature: f32,
    pub style_prompt: String,
    pub chunk_size_chars: u32,
    pub api_timeout_seconds: u32,
}

impl SynthesisParams {
    /// Parameters pre-filled with the snapshot's defaults.
    pub fn from_snapshot(
        snapshot: &ConfigurationSnapshot,
        text: impl Into<String>,
        voice_name: Option<String>,
    ) -> Self {
        Self {
            text: text.into(),
            voice_name,
            audio_format: snapshot.audio_format,
            temperature: snapshot.temperature,
            style_prompt: snapshot.style_prompt.clone(),
            chunk_size_chars: snapshot.chunk_size_chars,
            api_timeout_seconds: snapshot.api_timeout_seconds,
        }
    }

    /// Validate against the loaded catalog and build the immutable request.
    ///
    /// Text and style prompt are trimmed first.  Lengths are counted in
    /// characters.
    pub(crate) fn into_request(
        self,
        task_id: TaskId,
        catalog: &VoiceCatalog,
        max_text_chars: usize,
    ) -> Result<SynthesisRequest, ValidationFailure> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(ValidationFailure::EmptyText);
        }

        let voice_name = self
            .voice_name
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ValidationFailure::NoVoiceSelected)?;
        if !catalog.contains(&voice_name) {
            return Err(ValidationFailure::UnknownVoice(voice_name));
        }

        let len = text.chars().count();
        if len > max_text_chars {
            return Err(ValidationFailure::TextTooLong {
                len,
                max: max_text_chars,
            });
        }

        let style_prompt = self.style_prompt.trim().to_string();
        let style_len = style_prompt.chars().count();
        if style_len > MAX_STYLE_PROMPT_CHARS {
            return Err(ValidationFailure::StylePromptTooLong {
                len: style_len,
                max: MAX_STYLE_PROMPT_CHARS,
            });
        }

        if self.chunk_size_chars == 0 {
            return Err(ValidationFailure::InvalidChunkSize);
        }
        if self.api_timeout_seconds == 0 {
            return Err(ValidationFailure::InvalidTimeout);
        }

        Ok(SynthesisRequest {
            task_id,
            text,
            voice_name,
            audio_format: self.audio_format,
            temperature: self.temperature,
            style_prompt,
            chunk_size_chars: self.chunk_size_chars,
            api_timeout_seconds: self.api_timeout_seconds,
        })
    }
}

// ---------------------------------------------------------------------------
// Chunk estimate
// ---------------------------------------------------------------------------

/// How many chunks the server will split `text` into: `ceil(chars / size)`,
/// never less than one.
pub fn estimate_chunks(text: &str, chunk_size_chars: u32) -> usize {
    let chars = text.chars().count();
    let size = chunk_size_chars.max(1) as usize;
    chars.div_ceil(size).max(1)
}

/// The info status shown when a task starts.
pub fn synthesizing_message(chunks: usize, voice_name: &str) -> String {
    let label = if chunks == 1 { "chunk" } else { "chunks" };
    format!("Synthesizing {chunks} {label} with {voice_name}. Please wait.")
}

// ---------------------------------------------------------------------------
// Download naming
// ---------------------------------------------------------------------------

/// Replace every run of whitespace with a single underscore.
fn sanitize_voice_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// `YYYY.MM.DD-HH.MM.<voice>.<ext>`
pub fn download_file_name(timestamp: NaiveDateTime, voice_name: &str, format: AudioFormat) -> String {
    format!(
        "{}.{}.{}",
        timestamp.format("%Y.%m.%d-%H.%M"),
        sanitize_voice_name(voice_name),
        format.extension()
    )
}

// ---------------------------------------------------------------------------
// AudioArtifact
// ---------------------------------------------------------------------------

/// The payload of a completed task, ready to be played or saved.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub task_id: TaskId,
    pub voice_name: String,
    pub format: AudioFormat,
    /// `Content-Type` reported by the server, if any.
    pub content_type: Option<String>,
    /// Suggested download name.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AudioArtifact {
    pub(crate) fn new(
        request: &SynthesisRequest,
        content_type: Option<String>,
        bytes: Vec<u8>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            task_id: request.task_id.clone(),
            voice_name: request.voice_name.clone(),
            format: request.audio_format,
            content_type,
            file_name: download_file_name(timestamp, &request.voice_name, request.audio_format),
            bytes,
        }
    }

    /// Write the payload into `dir` under [`file_name`](Self::file_name),
    /// creating the directory if needed.
    pub fn save_in(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Voice;
    use chrono::NaiveDate;

    fn catalog() -> VoiceCatalog {
        VoiceCatalog::with_preferred(vec![Voice::new("Fenrir", "Excitable")], "Fenrir")
    }

    fn params(text: &str) -> SynthesisParams {
        SynthesisParams::from_snapshot(
            &ConfigurationSnapshot::default(),
            text,
            Some("Fenrir".into()),
        )
    }

    #[test]
    fn hello_world_is_one_chunk() {
        assert_eq!(estimate_chunks("Hello world", 1500), 1);
        assert_eq!(
            synthesizing_message(1, "Fenrir"),
            "Synthesizing 1 chunk with Fenrir. Please wait."
        );
    }

    #[test]
    fn long_text_rounds_up() {
        let text = "a".repeat(3200);
        assert_eq!(estimate_chunks(&text, 1500), 3);
        assert_eq!(estimate_chunks(&"a".repeat(3000), 1500), 2);
        assert_eq!(
            synthesizing_message(3, "Kore"),
            "Synthesizing 3 chunks with Kore. Please wait."
        );
    }

    #[test]
    fn empty_text_still_estimates_one_chunk() {
        assert_eq!(estimate_chunks("", 1500), 1);
    }

    #[test]
    fn valid_params_build_trimmed_request() {
        let mut p = params("  Hello world \n");
        p.style_prompt = "  Calm: ".into();
        let request = p
            .into_request(TaskId::from("t-1"), &catalog(), 20_000)
            .unwrap();
        assert_eq!(request.text, "Hello world");
        assert_eq!(request.style_prompt, "Calm:");
        assert_eq!(request.voice_name, "Fenrir");
        assert_eq!(request.task_id, TaskId::from("t-1"));
    }

    #[test]
    fn whitespace_only_text_is_empty() {
        let err = params("   ")
            .into_request(TaskId::generate(), &catalog(), 20_000)
            .unwrap_err();
        assert_eq!(err, ValidationFailure::EmptyText);
    }

    #[test]
    fn missing_or_unknown_voice_is_rejected() {
        let mut p = params("Hello");
        p.voice_name = None;
        assert_eq!(
            p.into_request(TaskId::generate(), &catalog(), 20_000),
            Err(ValidationFailure::NoVoiceSelected)
        );

        let mut p = params("Hello");
        p.voice_name = Some("Zephyr".into());
        assert_eq!(
            p.into_request(TaskId::generate(), &catalog(), 20_000),
            Err(ValidationFailure::UnknownVoice("Zephyr".into()))
        );
    }

    #[test]
    fn text_over_limit_is_rejected() {
        let err = params(&"a".repeat(11))
            .into_request(TaskId::generate(), &catalog(), 10)
            .unwrap_err();
        assert_eq!(err, ValidationFailure::TextTooLong { len: 11, max: 10 });
    }

    #[test]
    fn style_prompt_over_limit_is_rejected() {
        let mut p = params("Hello");
        p.style_prompt = "s".repeat(MAX_STYLE_PROMPT_CHARS + 1);
        assert!(matches!(
            p.into_request(TaskId::generate(), &catalog(), 20_000),
            Err(ValidationFailure::StylePromptTooLong { .. })
        ));
    }

    #[test]
    fn zero_chunk_size_and_timeout_are_rejected() {
        let mut p = params("Hello");
        p.chunk_size_chars = 0;
        assert_eq!(
            p.into_request(TaskId::generate(), &catalog(), 20_000),
            Err(ValidationFailure::InvalidChunkSize)
        );

        let mut p = params("Hello");
        p.api_timeout_seconds = 0;
        assert_eq!(
            p.into_request(TaskId::generate(), &catalog(), 20_000),
            Err(ValidationFailure::InvalidTimeout)
        );
    }

    #[test]
    fn download_name_has_timestamp_voice_and_extension() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 3)
            .unwrap()
            .and_hms_opt(9, 7, 0)
            .unwrap();
        assert_eq!(
            download_file_name(ts, "Deep  Voice\tTwo", AudioFormat::Mp3),
            "2024.05.03-09.07.Deep_Voice_Two.mp3"
        );
    }

    #[test]
    fn artifact_saves_under_its_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let request = params("Hello")
            .into_request(TaskId::from("t-9"), &catalog(), 20_000)
            .unwrap();
        let ts = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        let artifact = AudioArtifact::new(&request, Some("audio/wav".into()), vec![7; 4], ts);

        let path = artifact.save_in(dir.path()).unwrap();

        assert_eq!(artifact.file_name, "2025.01.02-13.45.Fenrir.wav");
        assert_eq!(std::fs::read(path).unwrap(), vec![7; 4]);
    }
}
