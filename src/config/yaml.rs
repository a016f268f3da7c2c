use serde::Deserialize;
use std::path::PathBuf;

use crate::core::pronunciation::Pronunciation;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file take priority over environment variables.
///
/// # Example YAML structure
/// ```yaml
/// avatar:
///   base_url: "https://cafes.example.com"
///   csrf_token: "token-from-the-web-session"
///   create_session_path: "/chat/avatar/crear-sesion/"
///   submit_text_path: "/chat/avatar/enviar-texto/"
///   stop_session_path: "/chat/avatar/detener/"
///   request_timeout_seconds: 30
///   voice_id: "es-voice"
///   speed: 1.0
///   emotion: "friendly"
///
/// local_voice:
///   enabled: true
///   espeak_bin: "/usr/bin/espeak-ng"
///   locale: "es"
///   name_hint: "Spanish"
///   rate: 0.9
///   pitch: 1.0
///   volume: 1.0
///
/// pronunciations:
///   - word: "cappuccino"
///     pronunciation: "capuchino"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub avatar: Option<AvatarYaml>,
    pub local_voice: Option<LocalVoiceYaml>,
    pub pronunciations: Option<Vec<Pronunciation>>,
}

/// Remote avatar configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AvatarYaml {
    pub base_url: Option<String>,
    pub csrf_token: Option<String>,
    pub create_session_path: Option<String>,
    pub submit_text_path: Option<String>,
    pub stop_session_path: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub voice_id: Option<String>,
    pub speed: Option<f32>,
    pub emotion: Option<String>,
}

/// Local voice configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LocalVoiceYaml {
    pub enabled: Option<bool>,
    pub espeak_bin: Option<String>,
    pub locale: Option<String>,
    pub name_hint: Option<String>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
