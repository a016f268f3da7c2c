//! Configuration module for the speech dispatcher
//!
//! This module handles configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use speech_dispatch::config::SpeechConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = SpeechConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = SpeechConfig::from_file(&config_path)?;
//!
//! println!("Avatar enabled: {}", config.has_avatar());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use zeroize::Zeroizing;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use utils::parse_bool;
pub use yaml::{AvatarYaml, LocalVoiceYaml, YamlConfig};

use crate::core::dispatcher::DispatcherConfig;
use crate::core::local::{EspeakConfig, VoiceSelector};
use crate::core::pronunciation::Pronunciation;
use crate::core::remote::{AvatarVoice, HttpAvatarConfig};

/// Speech dispatcher configuration
///
/// Contains everything needed to wire the dispatcher:
/// - Remote avatar backend (origin, CSRF token, endpoint paths, voice)
/// - Local voice (espeak binary, voice preference, prosody)
/// - Pronunciation replacements shared by both channels
#[derive(Clone)]
pub struct SpeechConfig {
    // Avatar settings
    /// Backend origin; the remote channel is disabled when absent
    pub avatar_base_url: Option<String>,
    pub avatar_csrf_token: Option<String>,
    pub avatar_create_session_path: String,
    pub avatar_submit_text_path: String,
    pub avatar_stop_session_path: String,
    pub avatar_request_timeout_seconds: u64,
    pub avatar_voice_id: Option<String>,
    pub avatar_speed: f32,
    pub avatar_emotion: String,

    // Local voice settings
    pub local_voice_enabled: bool,
    /// Explicit espeak binary; PATH is searched when absent
    pub espeak_bin: Option<PathBuf>,
    /// Preferred voice language prefix, e.g. "es"
    pub voice_locale: Option<String>,
    /// Substring preferred in the voice name, e.g. "Spanish"
    pub voice_name_hint: Option<String>,
    pub voice_rate: f32,
    pub voice_pitch: f32,
    pub voice_volume: f32,

    pub pronunciations: Vec<Pronunciation>,
}

/// Implement Drop to zeroize secret fields when SpeechConfig is dropped.
impl Drop for SpeechConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut token) = self.avatar_csrf_token {
            token.zeroize();
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("avatar_base_url", &self.avatar_base_url)
            .field(
                "avatar_csrf_token",
                &self.avatar_csrf_token.as_ref().map(|_| "<redacted>"),
            )
            .field("avatar_create_session_path", &self.avatar_create_session_path)
            .field("avatar_submit_text_path", &self.avatar_submit_text_path)
            .field("avatar_stop_session_path", &self.avatar_stop_session_path)
            .field(
                "avatar_request_timeout_seconds",
                &self.avatar_request_timeout_seconds,
            )
            .field("avatar_voice_id", &self.avatar_voice_id)
            .field("avatar_speed", &self.avatar_speed)
            .field("avatar_emotion", &self.avatar_emotion)
            .field("local_voice_enabled", &self.local_voice_enabled)
            .field("espeak_bin", &self.espeak_bin)
            .field("voice_locale", &self.voice_locale)
            .field("voice_name_hint", &self.voice_name_hint)
            .field("voice_rate", &self.voice_rate)
            .field("voice_pitch", &self.voice_pitch)
            .field("voice_volume", &self.voice_volume)
            .field("pronunciations", &self.pronunciations)
            .finish()
    }
}

impl SpeechConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded by the binary at startup, so actual ENV already
        // contains its values here
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the merged configuration
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_avatar_base_url(&self.avatar_base_url)?;
        validation::validate_endpoint_path(
            "AVATAR_CREATE_SESSION_PATH",
            &self.avatar_create_session_path,
        )?;
        validation::validate_endpoint_path(
            "AVATAR_SUBMIT_TEXT_PATH",
            &self.avatar_submit_text_path,
        )?;
        validation::validate_endpoint_path(
            "AVATAR_STOP_SESSION_PATH",
            &self.avatar_stop_session_path,
        )?;
        validation::validate_timeout(self.avatar_request_timeout_seconds)?;
        validation::validate_range("AVATAR_SPEED", self.avatar_speed, 0.5, 1.5)?;
        validation::validate_range("VOICE_RATE", self.voice_rate, 0.1, 10.0)?;
        validation::validate_range("VOICE_PITCH", self.voice_pitch, 0.0, 2.0)?;
        validation::validate_range("VOICE_VOLUME", self.voice_volume, 0.0, 2.0)?;
        Ok(())
    }

    /// Whether a remote avatar backend is configured
    pub fn has_avatar(&self) -> bool {
        self.avatar_base_url.is_some()
    }

    /// Build the HTTP avatar client configuration, if an avatar backend is configured
    pub fn http_avatar_config(&self) -> Option<HttpAvatarConfig> {
        let base_url = self.avatar_base_url.clone()?;
        Some(HttpAvatarConfig {
            base_url,
            csrf_token: self
                .avatar_csrf_token
                .as_ref()
                .map(|token| Zeroizing::new(token.clone())),
            create_session_path: self.avatar_create_session_path.clone(),
            submit_text_path: self.avatar_submit_text_path.clone(),
            stop_session_path: self.avatar_stop_session_path.clone(),
            request_timeout: Duration::from_secs(self.avatar_request_timeout_seconds),
            voice: AvatarVoice {
                voice_id: self.avatar_voice_id.clone(),
                speed: self.avatar_speed,
                emotion: self.avatar_emotion.clone(),
            },
            pronunciations: self.pronunciations.clone(),
        })
    }

    /// Build the espeak engine configuration
    pub fn espeak_config(&self) -> EspeakConfig {
        EspeakConfig {
            bin: self.espeak_bin.clone(),
            rate: self.voice_rate,
            pitch: self.voice_pitch,
            volume: self.voice_volume,
            pronunciations: self.pronunciations.clone(),
        }
    }

    /// Voice preference for the local channel
    pub fn voice_selector(&self) -> VoiceSelector {
        VoiceSelector::new(self.voice_locale.clone(), self.voice_name_hint.clone())
    }

    /// Build the dispatcher configuration
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            voice_selector: self.voice_selector(),
            local_fallback: self.local_voice_enabled,
        }
    }
}
