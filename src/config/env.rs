use super::SpeechConfig;
use super::merge::merge_config;

impl SpeechConfig {
    /// Load configuration from environment variables
    ///
    /// Reads configuration from environment variables, with sensible defaults.
    /// Also loads from .env file if present using dotenvy.
    ///
    /// # Returns
    /// * `Result<Self, Box<dyn std::error::Error>>` - The loaded configuration or an error
    ///
    /// # Errors
    /// Returns an error if:
    /// - Numeric or boolean environment variables are malformed
    /// - `AVATAR_BASE_URL` is not an http(s) URL
    /// - A prosody value is out of range
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let config = merge_config(None)?;
        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("AVATAR_BASE_URL");
            env::remove_var("AVATAR_CSRF_TOKEN");
            env::remove_var("AVATAR_SPEED");
            env::remove_var("LOCAL_VOICE_ENABLED");
            env::remove_var("VOICE_LOCALE");
            env::remove_var("VOICE_RATE");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_reads_avatar_settings() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AVATAR_BASE_URL", "https://cafes.example.com");
            env::set_var("AVATAR_CSRF_TOKEN", "csrf-from-env");
            env::set_var("AVATAR_SPEED", "1.25");
        }

        let config = SpeechConfig::from_env().unwrap();

        assert!(config.has_avatar());
        assert_eq!(config.avatar_csrf_token.as_deref(), Some("csrf-from-env"));
        assert_eq!(config.avatar_speed, 1.25);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_local_voice_settings() {
        cleanup_env_vars();
        unsafe {
            env::set_var("LOCAL_VOICE_ENABLED", "false");
            env::set_var("VOICE_LOCALE", "en");
        }

        let config = SpeechConfig::from_env().unwrap();

        assert!(!config.local_voice_enabled);
        assert_eq!(config.voice_selector().locale_prefix.as_deref(), Some("en"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_validates() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AVATAR_SPEED", "4.0");
        }

        let err = SpeechConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("AVATAR_SPEED"));

        cleanup_env_vars();
        unsafe {
            env::set_var("AVATAR_BASE_URL", "ftp://cafes.example.com");
        }
        assert!(SpeechConfig::from_env().is_err());

        cleanup_env_vars();
    }
}
