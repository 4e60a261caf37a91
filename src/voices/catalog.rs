//! The ordered list of voices and the current selection.

use crate::api::Voice;

/// Voices loaded from the server plus the selected entry.
///
/// Empty until a successful load.  An empty catalog disables submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    selected: Option<usize>,
}

impl VoiceCatalog {
    /// Build a catalog selecting `preferred` by display name, or the first
    /// voice when there is no match.
    pub fn with_preferred(voices: Vec<Voice>, preferred: &str) -> Self {
        let selected = voices
            .iter()
            .position(|v| v.display_name == preferred)
            .or(if voices.is_empty() { None } else { Some(0) });
        Self { voices, selected }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn selected(&self) -> Option<&Voice> {
        self.selected.and_then(|i| self.voices.get(i))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Select by display name.  Returns `false` (selection unchanged) when no
    /// voice has that name.
    pub fn select(&mut self, display_name: &str) -> bool {
        match self.position(display_name) {
            Some(i) => {
                self.selected = Some(i);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.position(display_name).is_some()
    }

    fn position(&self, display_name: &str) -> Option<usize> {
        self.voices.iter().position(|v| v.display_name == display_name)
    }
}
