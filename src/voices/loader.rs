//! `load_voices`: one round trip to `GET /api/voices` turned into a
//! [`VoiceCatalog`] plus exactly one final status message.

use thiserror::Error;

use crate::api::{ApiError, SynthesisBackend};
use crate::status::{Severity, StatusReporter};
use crate::voices::catalog::VoiceCatalog;

/// Why no catalog could be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// The server answered with an empty list.  Submission stays disabled
    /// until a reload.
    #[error("no voices available from the server")]
    NoVoicesAvailable,

    /// Transport failure or non-2xx response.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Fetch the voice list and select a default.
///
/// The server's `default_voice` wins; `fallback_default` (normally the
/// configuration snapshot's default voice) is used when the response names
/// none.  If neither matches, the first voice is selected.
pub async fn load_voices<R>(
    backend: &dyn SynthesisBackend,
    reporter: &R,
    fallback_default: &str,
) -> Result<VoiceCatalog, CatalogError>
where
    R: StatusReporter + ?Sized,
{
    reporter.report("Loading voices...", Severity::Info);

    let response = match backend.list_voices().await {
        Ok(r) => r,
        Err(e) => {
            log::error!("voices: error loading voices: {e}");
            reporter.report(&format!("Error loading voices: {e}"), Severity::Error);
            return Err(CatalogError::Api(e));
        }
    };

    let voices = response.voices.unwrap_or_default();
    if voices.is_empty() {
        log::warn!("voices: server returned an empty voice list");
        reporter.report("No voices available from the server.", Severity::Error);
        return Err(CatalogError::NoVoicesAvailable);
    }

    let preferred = response
        .default_voice
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback_default.to_string());

    let catalog = VoiceCatalog::with_preferred(voices, &preferred);
    let selected = catalog
        .selected()
        .map(|v| v.display_name.clone())
        .unwrap_or_default();

    if selected == preferred {
        reporter.report(
            &format!("Voices loaded. Using {preferred} as default."),
            Severity::Success,
        );
    } else {
        reporter.report(
            &format!("Voices loaded. Defaulting to: {selected}."),
            Severity::Success,
        );
    }

    log::info!("voices: {} voices loaded, selected {selected}", catalog.len());
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
