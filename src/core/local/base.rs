//! Base types for local (on-device) speech synthesis.

use tokio::sync::mpsc;

/// Local synthesis error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocalError {
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Failed to start speech engine: {0}")]
    SpawnFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for local synthesis operations
pub type LocalResult<T> = Result<T, LocalError>;

/// A voice installed in the local engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Identifier passed back to the engine
    pub id: String,
    /// Human readable name
    pub name: String,
    /// Language tag, e.g. `es`, `es-419`, `en-us`
    pub language: String,
    pub gender: Option<String>,
}

/// Voice preference for local synthesis.
///
/// Prefers a voice whose language starts with `locale_prefix` and whose name
/// contains `name_hint`, then any voice matching the locale, otherwise leaves
/// the choice to the engine default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceSelector {
    pub locale_prefix: Option<String>,
    pub name_hint: Option<String>,
}

impl VoiceSelector {
    pub fn new(locale_prefix: Option<String>, name_hint: Option<String>) -> Self {
        Self {
            locale_prefix,
            name_hint,
        }
    }

    /// Selector for a locale with an optional name hint
    pub fn locale(prefix: impl Into<String>) -> Self {
        Self {
            locale_prefix: Some(prefix.into()),
            name_hint: None,
        }
    }

    pub fn with_name_hint(mut self, hint: impl Into<String>) -> Self {
        self.name_hint = Some(hint.into());
        self
    }

    /// Pick the preferred voice, or `None` to use the engine default
    pub fn select<'a>(&self, voices: &'a [VoiceInfo]) -> Option<&'a VoiceInfo> {
        let locale = self.locale_prefix.as_deref().map(str::to_lowercase);
        let hint = self.name_hint.as_deref().map(str::to_lowercase);

        let matches_locale = |voice: &VoiceInfo| match locale {
            Some(ref prefix) => voice.language.to_lowercase().starts_with(prefix.as_str()),
            None => true,
        };
        let matches_hint = |voice: &VoiceInfo| match hint {
            Some(ref hint) => voice.name.to_lowercase().contains(hint.as_str()),
            None => false,
        };

        if let Some(voice) = voices.iter().find(|v| matches_locale(v) && matches_hint(v)) {
            return Some(voice);
        }
        if locale.is_some() {
            return voices.iter().find(|v| matches_locale(v));
        }
        None
    }
}

/// Progress of a single utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    Start,
    End,
    Error(String),
}

/// Completion stream for one submitted utterance
pub type UtteranceEvents = mpsc::UnboundedReceiver<UtteranceEvent>;

/// Base trait for on-device speech synthesis.
///
/// Submission is synchronous; progress arrives on the returned receiver.
/// Implementations that spawn work require a running Tokio runtime.
pub trait LocalSpeechChannel: Send + Sync {
    /// Whether the engine can speak at all
    fn is_available(&self) -> bool;

    /// Voices installed in the engine
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Start speaking `text`, cancelling any utterance still in progress.
    fn speak(&self, text: &str, selector: &VoiceSelector) -> LocalResult<UtteranceEvents>;

    /// Stop the current utterance, if any
    fn cancel(&self);

    /// Get provider-specific information
    fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({
            "provider": "unknown",
            "version": "1.0.0"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(id: &str, name: &str, language: &str) -> VoiceInfo {
        VoiceInfo {
            id: id.to_string(),
            name: name.to_string(),
            language: language.to_string(),
            gender: None,
        }
    }

    fn installed() -> Vec<VoiceInfo> {
        vec![
            voice("en-us", "English (America)", "en-us"),
            voice("es-419", "Latin American", "es-419"),
            voice("es", "Spanish (Spain)", "es"),
            voice("fr", "French", "fr-fr"),
        ]
    }

    #[test]
    fn test_prefers_locale_and_name_hint() {
        let voices = installed();
        let selector = VoiceSelector::locale("es").with_name_hint("Spanish");
        assert_eq!(selector.select(&voices).unwrap().id, "es");
    }

    #[test]
    fn test_falls_back_to_locale_only() {
        let voices = installed();
        let selector = VoiceSelector::locale("es").with_name_hint("Castilian");
        assert_eq!(selector.select(&voices).unwrap().id, "es-419");
    }

    #[test]
    fn test_locale_is_case_insensitive() {
        let voices = installed();
        let selector = VoiceSelector::locale("FR");
        assert_eq!(selector.select(&voices).unwrap().id, "fr");
    }

    #[test]
    fn test_no_match_uses_engine_default() {
        let voices = installed();
        assert!(VoiceSelector::locale("qu").select(&voices).is_none());
        assert!(VoiceSelector::default().select(&voices).is_none());
        assert!(VoiceSelector::locale("es").select(&[]).is_none());
    }

    #[test]
    fn test_name_hint_without_locale() {
        let voices = installed();
        let selector = VoiceSelector::new(None, Some("french".to_string()));
        assert_eq!(selector.select(&voices).unwrap().id, "fr");
    }
}
