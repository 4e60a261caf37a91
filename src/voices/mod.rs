//! Voice catalog: what can be selected, and how it is loaded.
//!
//! * [`VoiceCatalog`]: ordered voices plus the selection.
//! * [`load_voices`]: fetches the list, picks the default, reports status.
//! * [`CatalogError`]: `NoVoicesAvailable` or the underlying API failure.
//!
//! The controller wraps [`load_voices`] in
//! [`TaskController::reload_voices`](crate::controller::TaskController::reload_voices),
//! which installs the result and recomputes button state regardless of the
//! outcome.

pub mod catalog;
pub mod loader;

pub use catalog::VoiceCatalog;
pub use loader::{load_voices, CatalogError};
