use url::Url;

/// Validate the avatar backend origin
///
/// Must be an absolute http(s) URL when present.
pub fn validate_avatar_base_url(
    base_url: &Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(base_url) = base_url else {
        return Ok(());
    };

    let url = Url::parse(base_url)
        .map_err(|e| format!("AVATAR_BASE_URL is not a valid URL ({base_url}): {e}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!(
            "AVATAR_BASE_URL must use http or https, got '{}'",
            url.scheme()
        )
        .into());
    }
    Ok(())
}

/// Validate that an endpoint path is usable
pub fn validate_endpoint_path(name: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if path.trim().is_empty() {
        return Err(format!("{name} must not be empty").into());
    }
    if path.contains("://") {
        return Err(format!("{name} must be a path, not an absolute URL: {path}").into());
    }
    Ok(())
}

/// Validate that a numeric setting lies within an inclusive range
pub fn validate_range(
    name: &str,
    value: f32,
    min: f32,
    max: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{name} must be between {min} and {max}, got {value}").into());
    }
    Ok(())
}

/// Validate the request timeout
pub fn validate_timeout(seconds: u64) -> Result<(), Box<dyn std::error::Error>> {
    if seconds == 0 {
        return Err("AVATAR_REQUEST_TIMEOUT_SECONDS must be greater than 0".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_optional() {
        assert!(validate_avatar_base_url(&None).is_ok());
    }

    #[test]
    fn test_base_url_valid() {
        assert!(validate_avatar_base_url(&Some("https://cafes.example.com".to_string())).is_ok());
        assert!(validate_avatar_base_url(&Some("http://localhost:8000".to_string())).is_ok());
    }

    #[test]
    fn test_base_url_invalid() {
        let err = validate_avatar_base_url(&Some("cafes.example.com".to_string())).unwrap_err();
        assert!(err.to_string().contains("not a valid URL"));

        let err = validate_avatar_base_url(&Some("ws://cafes.example.com".to_string())).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_endpoint_path() {
        assert!(validate_endpoint_path("AVATAR_STOP_SESSION_PATH", "/chat/avatar/detener/").is_ok());
        assert!(validate_endpoint_path("AVATAR_STOP_SESSION_PATH", " ").is_err());
        assert!(
            validate_endpoint_path("AVATAR_STOP_SESSION_PATH", "https://evil.example.com/")
                .is_err()
        );
    }

    #[test]
    fn test_range() {
        assert!(validate_range("VOICE_RATE", 0.9, 0.1, 10.0).is_ok());
        assert!(validate_range("VOICE_RATE", 0.0, 0.1, 10.0).is_err());
        assert!(validate_range("VOICE_RATE", f32::NAN, 0.1, 10.0).is_err());
        let err = validate_range("VOICE_VOLUME", 3.0, 0.0, 2.0).unwrap_err();
        assert!(err.to_string().contains("VOICE_VOLUME"));
    }

    #[test]
    fn test_timeout() {
        assert!(validate_timeout(30).is_ok());
        assert!(validate_timeout(0).is_err());
    }
}
