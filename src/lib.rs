//! tts-desk: desktop client for a text-to-speech synthesis server.
//!
//! * [`api`]: the server endpoints behind the `SynthesisBackend` trait.
//! * [`config`]: local settings and the server-provided defaults.
//! * [`voices`]: the voice catalog and its loader.
//! * [`controller`]: the single-flight, cancellable task lifecycle.
//! * [`app`]: the egui front-end.

pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod status;
pub mod voices;

#[cfg(test)]
pub(crate) mod testing;
