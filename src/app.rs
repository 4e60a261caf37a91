//! tts-desk window: egui/eframe application.
//!
//! # Architecture
//!
//! [`TtsDeskApp`] is the top-level [`eframe::App`].  It owns the form state
//! and drives a shared [`TaskController`]:
//!
//! * user actions call `submit` (spawned on the tokio runtime) and `cancel`;
//! * the controller reports back through a [`ChannelObserver`], whose
//!   [`UiEvent`]s are drained once per frame.
//!
//! Button state is never computed here; it is whatever the last
//! [`Controls`] event said.
//!
//! # Layout
//!
//! | Section | Contents |
//! |---------|----------|
//! | Header  | title, theme toggle |
//! | Form    | text + counter, voice, format, temperature, chunk size, timeout, style |
//! | Actions | Synthesize / Cancel |
//! | Status  | last message, coloured by severity |
//! | Output  | size and suggested name of the last payload, Save button |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::api::{AudioFormat, TaskId};
use crate::config::{AppConfig, AppPaths, Theme, MAX_STYLE_PROMPT_CHARS};
use crate::controller::{AudioArtifact, Controls, SynthesisParams, TaskController, TaskObserver};
use crate::status::{Severity, StatusReporter};
use crate::voices::VoiceCatalog;

// ---------------------------------------------------------------------------
// Controller → UI messages
// ---------------------------------------------------------------------------

/// Everything the controller tells the window, in the order it happened.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Status { message: String, severity: Severity },
    TaskStarted(TaskId),
    TaskEnded,
    Controls(Controls),
    AudioReady(AudioArtifact),
    VoicesLoaded(VoiceCatalog),
}

/// [`TaskObserver`] that forwards every callback as a [`UiEvent`].
///
/// Sends never block; events sent after the window has closed are dropped.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("app: window closed, dropping controller event");
        }
    }
}

impl StatusReporter for ChannelObserver {
    fn report(&self, message: &str, severity: Severity) {
        self.send(UiEvent::Status {
            message: message.to_string(),
            severity,
        });
    }
}

impl TaskObserver for ChannelObserver {
    fn on_task_started(&self, task_id: &TaskId) {
        self.send(UiEvent::TaskStarted(task_id.clone()));
    }

    fn on_task_ended(&self) {
        self.send(UiEvent::TaskEnded);
    }

    fn on_controls_changed(&self, controls: Controls) {
        self.send(UiEvent::Controls(controls));
    }

    fn on_audio_ready(&self, artifact: &AudioArtifact) {
        self.send(UiEvent::AudioReady(artifact.clone()));
    }

    fn on_voices_loaded(&self, catalog: &VoiceCatalog) {
        self.send(UiEvent::VoicesLoaded(catalog.clone()));
    }
}

// ---------------------------------------------------------------------------
// TtsDeskApp
// ---------------------------------------------------------------------------

/// eframe application: the synthesis form.
pub struct TtsDeskApp {
    // ── Controller ───────────────────────────────────────────────────────
    controller: Arc<TaskController>,
    /// Runtime the controller's futures run on.
    rt: tokio::runtime::Handle,
    events: mpsc::UnboundedReceiver<UiEvent>,

    // ── Form ─────────────────────────────────────────────────────────────
    text: String,
    voice: Option<String>,
    audio_format: AudioFormat,
    temperature: f32,
    chunk_size_chars: u32,
    api_timeout_seconds: u32,
    style_prompt: String,

    // ── Controller view ──────────────────────────────────────────────────
    catalog: VoiceCatalog,
    controls: Controls,
    status: Option<(String, Severity)>,
    active_task: Option<TaskId>,
    artifact: Option<AudioArtifact>,
    saved_to: Option<PathBuf>,

    // ── Settings ─────────────────────────────────────────────────────────
    config: AppConfig,
    paths: AppPaths,
    theme: Theme,
}

impl TtsDeskApp {
    /// Create the window state.
    ///
    /// * `controller`: shared controller; voices may still be loading.
    /// * `rt`:         handle of the runtime that drives the controller.
    /// * `events`:     receiving end of the [`ChannelObserver`].
    /// * `config`:     local settings, written back on theme toggle.
    /// * `theme`:      theme resolved at startup.
    pub fn new(
        controller: Arc<TaskController>,
        rt: tokio::runtime::Handle,
        events: mpsc::UnboundedReceiver<UiEvent>,
        config: AppConfig,
        theme: Theme,
    ) -> Self {
        let snapshot = controller.snapshot().clone();
        let controls = controller.controls();
        Self {
            controller,
            rt,
            events,
            text: String::new(),
            voice: None,
            audio_format: snapshot.audio_format,
            temperature: snapshot.temperature,
            chunk_size_chars: snapshot.chunk_size_chars,
            api_timeout_seconds: snapshot.api_timeout_seconds,
            style_prompt: snapshot.style_prompt,
            catalog: VoiceCatalog::empty(),
            controls,
            status: None,
            active_task: None,
            artifact: None,
            saved_to: None,
            config,
            paths: AppPaths::new(),
            theme,
        }
    }

    // ── Event polling ────────────────────────────────────────────────────

    /// Drain all pending controller events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                UiEvent::Status { message, severity } => {
                    self.status = Some((message, severity));
                }
                UiEvent::TaskStarted(task_id) => {
                    self.active_task = Some(task_id);
                }
                UiEvent::TaskEnded => {
                    self.active_task = None;
                }
                UiEvent::Controls(controls) => {
                    self.controls = controls;
                }
                UiEvent::AudioReady(artifact) => {
                    self.saved_to = None;
                    self.artifact = Some(artifact);
                }
                UiEvent::VoicesLoaded(catalog) => {
                    self.voice = catalog.selected().map(|v| v.display_name.clone());
                    self.catalog = catalog;
                }
            }
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    fn params(&self) -> SynthesisParams {
        SynthesisParams {
            text: self.text.clone(),
            voice_name: self.voice.clone(),
            audio_format: self.audio_format,
            temperature: self.temperature,
            style_prompt: self.style_prompt.clone(),
            chunk_size_chars: self.chunk_size_chars,
            api_timeout_seconds: self.api_timeout_seconds,
        }
    }

    fn submit(&mut self) {
        let params = self.params();
        self.artifact = None;
        self.saved_to = None;

        let controller = Arc::clone(&self.controller);
        self.rt.spawn(async move {
            controller.submit(params).await;
        });
    }

    fn cancel(&self) {
        // `cancel` spawns the remote notification onto the current runtime.
        let _guard = self.rt.enter();
        self.controller.cancel();
    }

    fn save_artifact(&mut self) {
        let Some(artifact) = &self.artifact else {
            return;
        };
        match artifact.save_in(&self.paths.downloads_dir) {
            Ok(path) => {
                log::info!("app: saved audio to {}", path.display());
                self.saved_to = Some(path);
            }
            Err(e) => {
                log::error!("app: failed to save audio: {e}");
                self.status = Some((format!("Could not save audio: {e}"), Severity::Error));
            }
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.theme = self.theme.toggled();
        ctx.set_visuals(visuals_for(self.theme));

        self.config.ui.theme = Some(self.theme);
        if let Err(e) = self.config.save() {
            log::warn!("app: failed to persist theme preference: {e}");
        }
    }

    // ── Section renderers ────────────────────────────────────────────────

    fn draw_header(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.heading("tts-desk");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut dark = self.theme == Theme::Dark;
                if ui.checkbox(&mut dark, "Dark mode").changed() {
                    self.toggle_theme(ctx);
                }
            });
        });
    }

    fn draw_form(&mut self, ui: &mut egui::Ui) {
        let max_chars = self.controller.snapshot().max_text_chars;
        let editable = !self.controls.cancel_enabled && !self.controls.cancelling;

        ui.label("Text");
        ui.add_enabled(
            editable,
            egui::TextEdit::multiline(&mut self.text)
                .char_limit(max_chars)
                .desired_rows(8)
                .desired_width(f32::INFINITY),
        );
        ui.label(
            egui::RichText::new(format!("{} / {max_chars}", self.text.chars().count()))
                .small()
                .weak(),
        );

        ui.add_space(6.0);
        egui::Grid::new("synthesis-options")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label("Voice");
                let selected = self.voice.clone().unwrap_or_else(|| "Loading voices...".into());
                egui::ComboBox::from_id_salt("voice")
                    .selected_text(selected)
                    .width(260.0)
                    .show_ui(ui, |ui| {
                        for voice in self.catalog.voices() {
                            ui.selectable_value(
                                &mut self.voice,
                                Some(voice.display_name.clone()),
                                voice.label(),
                            );
                        }
                    });
                ui.end_row();

                ui.label("Format");
                ui.horizontal(|ui| {
                    for format in AudioFormat::ALL {
                        ui.radio_value(&mut self.audio_format, format, format.to_string());
                    }
                });
                ui.end_row();

                ui.label("Temperature");
                ui.add(egui::Slider::new(&mut self.temperature, 0.0..=2.0).step_by(0.05));
                ui.end_row();

                ui.label("Chunk size");
                ui.add(egui::Slider::new(&mut self.chunk_size_chars, 100..=5000).suffix(" chars"));
                ui.end_row();

                ui.label("API timeout");
                ui.add(egui::Slider::new(&mut self.api_timeout_seconds, 10..=600).suffix(" s"));
                ui.end_row();
            });

        ui.add_space(6.0);
        ui.label("Style instructions");
        ui.add(
            egui::TextEdit::singleline(&mut self.style_prompt)
                .char_limit(MAX_STYLE_PROMPT_CHARS)
                .desired_width(f32::INFINITY),
        );
        ui.label(
            egui::RichText::new(format!(
                "{} / {MAX_STYLE_PROMPT_CHARS}",
                self.style_prompt.chars().count()
            ))
            .small()
            .weak(),
        );
    }

    fn draw_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.controls.submit_enabled, egui::Button::new("Synthesize"))
                .clicked()
            {
                self.submit();
            }
            if ui
                .add_enabled(
                    self.controls.cancel_enabled,
                    egui::Button::new(self.controls.cancel_label()),
                )
                .clicked()
            {
                self.cancel();
            }
            if self.active_task.is_some() {
                ui.spinner();
            }
        });
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        if let Some((message, severity)) = &self.status {
            ui.colored_label(severity_color(*severity), message.as_str());
        }
    }

    fn draw_output(&mut self, ui: &mut egui::Ui) {
        let Some(artifact) = &self.artifact else {
            return;
        };

        ui.separator();
        ui.label(egui::RichText::new("Audio output").strong());
        ui.label(format!(
            "{}  ({} KB, {})",
            artifact.file_name,
            artifact.bytes.len().div_ceil(1024),
            artifact
                .content_type
                .as_deref()
                .unwrap_or("unknown type")
        ));

        let mut save = false;
        ui.horizontal(|ui| {
            save = ui.button("Save").clicked();
            if let Some(path) = &self.saved_to {
                ui.label(egui::RichText::new(format!("Saved to {}", path.display())).weak());
            }
        });
        if save {
            self.save_artifact();
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// egui visuals for a theme.
pub fn visuals_for(theme: Theme) -> egui::Visuals {
    match theme {
        Theme::Dark => egui::Visuals::dark(),
        Theme::Light => egui::Visuals::light(),
    }
}

fn severity_color(severity: Severity) -> egui::Color32 {
    match severity {
        Severity::Info => egui::Color32::from_rgb(68, 136, 255),
        Severity::Success => egui::Color32::from_rgb(80, 200, 120),
        Severity::Error => egui::Color32::from_rgb(255, 100, 80),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for TtsDeskApp {
    /// Called every frame by eframe.  Drains controller events, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        // Controller events arrive from other threads; poll for them while
        // anything can still change.
        let interval = if self.active_task.is_some() || self.catalog.is_empty() {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(500)
        };
        ctx.request_repaint_after(interval);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_header(ui, ctx);
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_form(ui);
                ui.add_space(8.0);
                self.draw_actions(ui);
                ui.add_space(4.0);
                self.draw_status(ui);
                self.draw_output(ui);
            });
        });
    }

    /// Abort any in-flight request when the window closes.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("app: window closing");
        self.controller.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
