use crate::error::domain_error::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub id: String,
    pub display_name: String,
    pub language_tag: String,
}

/// Voices reported by the platform, restricted to one language. Starts empty: browsers
/// usually publish their voices some time after the page loads.
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    language_prefix: String,
    voices: Vec<Voice>,
    selected: Option<String>,
}

impl VoiceCatalog {
    pub fn new(language_prefix: &str) -> Self {
        Self {
            language_prefix: language_prefix.to_string(),
            voices: Vec::default(),
            selected: None,
        }
    }

    pub fn list_voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Replaces the catalog with a new platform list, keeping the selection if the
    /// selected voice is still there.
    pub fn refresh(&mut self, voices: Vec<Voice>) {
        self.voices = voices
            .into_iter()
            .filter(|voice| voice.language_tag.starts_with(&self.language_prefix))
            .collect();
        if let Some(selected) = &self.selected {
            if !self.voices.iter().any(|voice| &voice.id == selected) {
                log::info!("Selected voice is gone, falling back to the default one. VoiceId: '{selected}'.");
                self.selected = None;
            }
        }
        log::debug!(
            "Voice catalog refreshed. Language: '{}', Voices: '{}'.",
            self.language_prefix,
            self.voices.len()
        );
    }

    pub fn select(&mut self, voice_id: &str) -> Result<(), DomainError> {
        if self.voices.iter().any(|voice| voice.id == voice_id) {
            self.selected = Some(voice_id.to_string());
            Ok(())
        } else {
            Err(DomainError::UnknownVoice(voice_id.to_string()))
        }
    }

    /// The selected voice, or the first one.
    pub fn resolve(&self) -> Option<&Voice> {
        self.selected
            .as_ref()
            .and_then(|selected| self.voices.iter().find(|voice| &voice.id == selected))
            .or_else(|| self.voices.first())
    }
}
