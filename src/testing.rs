//! Test doubles for the backend and observer seams.
//!
//! [`MockBackend`] answers from scripted queues and records what it was
//! asked; [`RecordingObserver`] keeps every callback in order.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::api::{
    ApiError, AudioResponse, SynthesisBackend, SynthesisRequest, TaskId, VoiceListResponse,
};
use crate::controller::{AudioArtifact, Controls, TaskObserver};
use crate::status::{Severity, StatusReporter};
use crate::voices::VoiceCatalog;

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

/// What the next `synthesize` call does.  An empty queue never answers.
pub enum SynthScript {
    Respond(Result<Vec<u8>, ApiError>),
    /// Answer with whatever is sent; never answers if the sender is dropped.
    Gate(oneshot::Receiver<Result<Vec<u8>, ApiError>>),
    /// Return the response head at once and the body when it is sent.
    SlowBody(oneshot::Receiver<Vec<u8>>),
    /// Return the response head at once and fail while reading the body.
    BrokenBody(String),
}

impl SynthScript {
    pub fn ok(bytes: Vec<u8>) -> Self {
        SynthScript::Respond(Ok(bytes))
    }

    pub fn err(error: ApiError) -> Self {
        SynthScript::Respond(Err(error))
    }
}

/// What the next `cancel_task` call does.  An empty queue acknowledges.
pub enum CancelScript {
    Ack,
    Fail,
    Gate(oneshot::Receiver<Result<(), ApiError>>),
}

#[derive(Default)]
pub struct MockBackend {
    config: Mutex<Option<Result<serde_json::Value, ApiError>>>,
    voices: Mutex<Option<Result<VoiceListResponse, ApiError>>>,
    synth: Mutex<VecDeque<SynthScript>>,
    cancel: Mutex<VecDeque<CancelScript>>,
    synth_requests: Mutex<Vec<SynthesisRequest>>,
    cancelled: Mutex<Vec<TaskId>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(self, config: Result<serde_json::Value, ApiError>) -> Self {
        *self.config.lock().unwrap() = Some(config);
        self
    }

    pub fn with_voices(self, voices: Result<VoiceListResponse, ApiError>) -> Self {
        *self.voices.lock().unwrap() = Some(voices);
        self
    }

    pub fn push_synth(self, script: SynthScript) -> Self {
        self.synth.lock().unwrap().push_back(script);
        self
    }

    pub fn push_cancel(self, script: CancelScript) -> Self {
        self.cancel.lock().unwrap().push_back(script);
        self
    }

    pub fn synth_requests(&self) -> Vec<SynthesisRequest> {
        self.synth_requests.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<TaskId> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisBackend for MockBackend {
    async fn fetch_config(&self) -> Result<serde_json::Value, ApiError> {
        self.config
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(ApiError::Network("no config scripted".into())))
    }

    async fn list_voices(&self) -> Result<VoiceListResponse, ApiError> {
        self.voices
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(VoiceListResponse::default()))
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioResponse, ApiError> {
        self.synth_requests.lock().unwrap().push(request.clone());
        let script = self.synth.lock().unwrap().pop_front();
        let content_type = Some(format!("audio/{}", request.audio_format));

        match script {
            None => std::future::pending().await,
            Some(SynthScript::Respond(result)) => {
                result.map(|bytes| AudioResponse::ready(content_type, bytes))
            }
            Some(SynthScript::Gate(rx)) => match rx.await {
                Ok(result) => result.map(|bytes| AudioResponse::ready(content_type, bytes)),
                Err(_) => std::future::pending().await,
            },
            Some(SynthScript::SlowBody(rx)) => Ok(AudioResponse::new(content_type, async move {
                match rx.await {
                    Ok(bytes) => Ok(bytes),
                    Err(_) => std::future::pending().await,
                }
            })),
            Some(SynthScript::BrokenBody(message)) => {
                Ok(AudioResponse::new(content_type, async move {
                    Err(ApiError::Network(message))
                }))
            }
        }
    }

    async fn cancel_task(&self, task_id: &TaskId) -> Result<(), ApiError> {
        self.cancelled.lock().unwrap().push(task_id.clone());
        let script = self.cancel.lock().unwrap().pop_front();

        match script.unwrap_or(CancelScript::Ack) {
            CancelScript::Ack => Ok(()),
            CancelScript::Fail => Err(ApiError::Network("cancel endpoint unreachable".into())),
            CancelScript::Gate(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Network("gate dropped".into()))),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Status(String, Severity),
    Started(TaskId),
    Ended,
    Controls(Controls),
    AudioReady(AudioArtifact),
    /// Number of voices in the installed catalog.
    VoicesLoaded(usize),
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn statuses(&self) -> Vec<(String, Severity)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Status(message, severity) => Some((message, severity)),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<(String, Severity)> {
        self.statuses().pop()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl StatusReporter for RecordingObserver {
    fn report(&self, message: &str, severity: Severity) {
        self.push(Event::Status(message.to_string(), severity));
    }
}

impl TaskObserver for RecordingObserver {
    fn on_task_started(&self, task_id: &TaskId) {
        self.push(Event::Started(task_id.clone()));
    }

    fn on_task_ended(&self) {
        self.push(Event::Ended);
    }

    fn on_controls_changed(&self, controls: Controls) {
        self.push(Event::Controls(controls));
    }

    fn on_audio_ready(&self, artifact: &AudioArtifact) {
        self.push(Event::AudioReady(artifact.clone()));
    }

    fn on_voices_loaded(&self, catalog: &VoiceCatalog) {
        self.push(Event::VoicesLoaded(catalog.len()));
    }
}
