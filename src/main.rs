//! Application entry point: tts-desk.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime.
//! 4. Build the HTTP backend and fetch the server's configuration snapshot.
//! 5. Create the controller with a channel observer for the window.
//! 6. Start loading voices in the background.
//! 7. Run [`eframe::run_native`]; blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tts_desk::{
    api::{HttpBackend, SynthesisBackend},
    app::{visuals_for, ChannelObserver, TtsDeskApp},
    config::{load_config, AppConfig},
    controller::{TaskController, TaskObserver},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("tts-desk")
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 480.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("tts-desk starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // 4. Backend + server defaults (best-effort)
    let backend: Arc<dyn SynthesisBackend> = Arc::new(HttpBackend::from_config(&config.server));
    log::info!("Synthesis server: {}", config.server.base_url);
    let snapshot = rt.block_on(load_config(backend.as_ref()));
    let theme = config.effective_theme(snapshot.theme);

    // 5. Controller
    let (observer, events) = ChannelObserver::new();
    let observer: Arc<dyn TaskObserver> = Arc::new(observer);
    let controller = Arc::new(TaskController::new(backend, observer, snapshot));

    // 6. Voices
    {
        let controller = Arc::clone(&controller);
        rt.spawn(async move {
            if let Err(e) = controller.reload_voices().await {
                log::warn!("Voice list unavailable: {e}");
            }
        });
    }

    // 7. Window (blocks until closed)
    let app = TtsDeskApp::new(controller, rt.handle().clone(), events, config.clone(), theme);
    let options = native_options(&config);

    eframe::run_native(
        "tts-desk",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(visuals_for(theme));
            Ok(Box::new(app))
        }),
    )
}
