use std::env;
use std::path::PathBuf;

use super::SpeechConfig;
use super::utils::{non_empty, parse_bool};
use super::yaml::YamlConfig;
use crate::core::remote::{
    DEFAULT_CREATE_SESSION_PATH, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STOP_SESSION_PATH,
    DEFAULT_SUBMIT_TEXT_PATH,
};

/// Merge YAML configuration with environment variables
///
/// Priority order (highest to lowest):
/// 1. YAML configuration values
/// 2. Environment variables
/// 3. Default values
///
/// # Arguments
/// * `yaml_config` - Optional YAML configuration to use as overrides
///
/// # Returns
/// * `Result<SpeechConfig, Box<dyn std::error::Error>>` - The merged configuration or an error
pub fn merge_config(
    yaml_config: Option<YamlConfig>,
) -> Result<SpeechConfig, Box<dyn std::error::Error>> {
    let yaml = yaml_config.unwrap_or_default();
    let avatar = yaml.avatar.unwrap_or_default();
    let local = yaml.local_voice.unwrap_or_default();

    // Helper macro to get value with priority: YAML > ENV > Default
    macro_rules! get_value {
        ($env_var:expr, $yaml_value:expr, $default:expr) => {
            non_empty($yaml_value)
                .or_else(|| non_empty(env::var($env_var).ok()))
                .unwrap_or_else(|| $default.to_string())
        };
    }

    // Helper macro for optional values: YAML > ENV
    macro_rules! get_optional {
        ($env_var:expr, $yaml_value:expr) => {
            non_empty($yaml_value).or_else(|| non_empty(env::var($env_var).ok()))
        };
    }

    // Helper macro for parsed values: YAML > ENV (must parse) > Default
    macro_rules! get_parsed {
        ($env_var:expr, $yaml_value:expr, $ty:ty, $default:expr) => {
            match $yaml_value {
                Some(value) => value,
                None => match non_empty(env::var($env_var).ok()) {
                    Some(raw) => raw.trim().parse::<$ty>().map_err(|e| {
                        format!("Invalid {} environment variable '{raw}': {e}", $env_var)
                    })?,
                    None => $default,
                },
            }
        };
    }

    // Avatar configuration
    let avatar_base_url = get_optional!("AVATAR_BASE_URL", avatar.base_url);
    let avatar_csrf_token = get_optional!("AVATAR_CSRF_TOKEN", avatar.csrf_token);
    let avatar_create_session_path = get_value!(
        "AVATAR_CREATE_SESSION_PATH",
        avatar.create_session_path,
        DEFAULT_CREATE_SESSION_PATH
    );
    let avatar_submit_text_path = get_value!(
        "AVATAR_SUBMIT_TEXT_PATH",
        avatar.submit_text_path,
        DEFAULT_SUBMIT_TEXT_PATH
    );
    let avatar_stop_session_path = get_value!(
        "AVATAR_STOP_SESSION_PATH",
        avatar.stop_session_path,
        DEFAULT_STOP_SESSION_PATH
    );
    let avatar_request_timeout_seconds = get_parsed!(
        "AVATAR_REQUEST_TIMEOUT_SECONDS",
        avatar.request_timeout_seconds,
        u64,
        DEFAULT_REQUEST_TIMEOUT_SECS
    );
    let avatar_voice_id = get_optional!("AVATAR_VOICE_ID", avatar.voice_id);
    let avatar_speed = get_parsed!("AVATAR_SPEED", avatar.speed, f32, 1.0);
    let avatar_emotion = get_value!("AVATAR_EMOTION", avatar.emotion, "friendly");

    // Local voice configuration
    let local_voice_enabled = match local.enabled {
        Some(enabled) => enabled,
        None => match non_empty(env::var("LOCAL_VOICE_ENABLED").ok()) {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| format!("Invalid LOCAL_VOICE_ENABLED value '{raw}'"))?,
            None => true,
        },
    };
    let espeak_bin = get_optional!("ESPEAK_BIN", local.espeak_bin).map(PathBuf::from);
    let voice_locale = get_optional!("VOICE_LOCALE", local.locale).or(Some("es".to_string()));
    let voice_name_hint =
        get_optional!("VOICE_NAME_HINT", local.name_hint).or(Some("Spanish".to_string()));
    let voice_rate = get_parsed!("VOICE_RATE", local.rate, f32, 0.9);
    let voice_pitch = get_parsed!("VOICE_PITCH", local.pitch, f32, 1.0);
    let voice_volume = get_parsed!("VOICE_VOLUME", local.volume, f32, 1.0);

    let pronunciations = yaml.pronunciations.unwrap_or_default();

    Ok(SpeechConfig {
        avatar_base_url,
        avatar_csrf_token,
        avatar_create_session_path,
        avatar_submit_text_path,
        avatar_stop_session_path,
        avatar_request_timeout_seconds,
        avatar_voice_id,
        avatar_speed,
        avatar_emotion,
        local_voice_enabled,
        espeak_bin,
        voice_locale,
        voice_name_hint,
        voice_rate,
        voice_pitch,
        voice_volume,
        pronunciations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::yaml::{AvatarYaml, LocalVoiceYaml};
    use serial_test::serial;

    const VARS: &[&str] = &[
        "AVATAR_BASE_URL",
        "AVATAR_CSRF_TOKEN",
        "AVATAR_CREATE_SESSION_PATH",
        "AVATAR_SUBMIT_TEXT_PATH",
        "AVATAR_STOP_SESSION_PATH",
        "AVATAR_REQUEST_TIMEOUT_SECONDS",
        "AVATAR_VOICE_ID",
        "AVATAR_SPEED",
        "AVATAR_EMOTION",
        "LOCAL_VOICE_ENABLED",
        "ESPEAK_BIN",
        "VOICE_LOCALE",
        "VOICE_NAME_HINT",
        "VOICE_RATE",
        "VOICE_PITCH",
        "VOICE_VOLUME",
    ];

    fn cleanup_env_vars() {
        unsafe {
            for var in VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_merge_defaults() {
        cleanup_env_vars();

        let config = merge_config(None).unwrap();

        assert!(config.avatar_base_url.is_none());
        assert!(config.avatar_csrf_token.is_none());
        assert_eq!(config.avatar_create_session_path, DEFAULT_CREATE_SESSION_PATH);
        assert_eq!(config.avatar_request_timeout_seconds, 30);
        assert_eq!(config.avatar_speed, 1.0);
        assert_eq!(config.avatar_emotion, "friendly");
        assert!(config.local_voice_enabled);
        assert_eq!(config.voice_locale.as_deref(), Some("es"));
        assert_eq!(config.voice_name_hint.as_deref(), Some("Spanish"));
        assert_eq!(config.voice_rate, 0.9);
        assert!(config.pronunciations.is_empty());
    }

    #[test]
    #[serial]
    fn test_merge_env_only() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AVATAR_BASE_URL", "https://env.example.com");
            env::set_var("AVATAR_REQUEST_TIMEOUT_SECONDS", "5");
            env::set_var("LOCAL_VOICE_ENABLED", "no");
            env::set_var("VOICE_RATE", "1.5");
            env::set_var("ESPEAK_BIN", "/usr/local/bin/espeak-ng");
        }

        let config = merge_config(None).unwrap();

        assert_eq!(
            config.avatar_base_url.as_deref(),
            Some("https://env.example.com")
        );
        assert_eq!(config.avatar_request_timeout_seconds, 5);
        assert!(!config.local_voice_enabled);
        assert_eq!(config.voice_rate, 1.5);
        assert_eq!(
            config.espeak_bin,
            Some(PathBuf::from("/usr/local/bin/espeak-ng"))
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_yaml_overrides_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AVATAR_BASE_URL", "https://env.example.com");
            env::set_var("AVATAR_EMOTION", "serious");
            env::set_var("VOICE_LOCALE", "en");
        }

        let yaml = YamlConfig {
            avatar: Some(AvatarYaml {
                base_url: Some("https://yaml.example.com".to_string()),
                ..Default::default()
            }),
            local_voice: Some(LocalVoiceYaml {
                locale: Some("es-419".to_string()),
                ..Default::default()
            }),
            pronunciations: None,
        };
        let config = merge_config(Some(yaml)).unwrap();

        assert_eq!(
            config.avatar_base_url.as_deref(),
            Some("https://yaml.example.com")
        );
        // Not set in YAML, falls through to ENV
        assert_eq!(config.avatar_emotion, "serious");
        assert_eq!(config.voice_locale.as_deref(), Some("es-419"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_blank_env_is_ignored() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AVATAR_BASE_URL", "");
            env::set_var("VOICE_PITCH", "  ");
        }

        let config = merge_config(None).unwrap();

        assert!(config.avatar_base_url.is_none());
        assert_eq!(config.voice_pitch, 1.0);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_merge_invalid_numbers() {
        cleanup_env_vars();
        unsafe {
            env::set_var("VOICE_VOLUME", "loud");
        }

        let err = merge_config(None).unwrap_err();
        assert!(err.to_string().contains("VOICE_VOLUME"));

        cleanup_env_vars();
        unsafe {
            env::set_var("LOCAL_VOICE_ENABLED", "sometimes");
        }
        let err = merge_config(None).unwrap_err();
        assert!(err.to_string().contains("LOCAL_VOICE_ENABLED"));

        cleanup_env_vars();
    }
}
