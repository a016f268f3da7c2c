//! HTTP avatar session client.
//!
//! Talks to the web backend that brokers avatar streaming sessions. The backend
//! exposes three JSON endpoints:
//!
//! - `POST /chat/avatar/crear-sesion/` - `{voice: {voice_id, speed, emotion}}` - provision a session
//! - `POST /chat/avatar/enviar-texto/` - `{session_id, text}` - make the avatar speak
//! - `POST /chat/avatar/detener/` - `{session_id}` - tear the session down
//!
//! Each responds with `{"success": bool, ...}`. Paths are configurable.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;
use zeroize::Zeroizing;

use super::base::{
    AvatarVoice, RemoteChannel, RemoteError, RemoteEvent, RemoteEvents, RemoteResult, SessionInfo,
};
use super::messages::{
    AckResponse, CreateSessionRequest, CreateSessionResponse, StopSessionRequest,
    SubmitTextRequest, VoiceSettings,
};
use crate::core::pronunciation::{Pronunciation, PronunciationReplacer};
use crate::core::sanitize::preview;

pub const DEFAULT_CREATE_SESSION_PATH: &str = "/chat/avatar/crear-sesion/";
pub const DEFAULT_SUBMIT_TEXT_PATH: &str = "/chat/avatar/enviar-texto/";
pub const DEFAULT_STOP_SESSION_PATH: &str = "/chat/avatar/detener/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Header carrying the backend's CSRF token
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Configuration for [`HttpAvatarClient`]
#[derive(Clone)]
pub struct HttpAvatarConfig {
    /// Backend origin, e.g. `https://cafes.example.com`
    pub base_url: String,
    /// CSRF token sent with every request
    pub csrf_token: Option<Zeroizing<String>>,
    pub create_session_path: String,
    pub submit_text_path: String,
    pub stop_session_path: String,
    pub request_timeout: Duration,
    /// Voice parameters attached to provisioned sessions
    pub voice: AvatarVoice,
    /// Pronunciation replacements applied before submission
    pub pronunciations: Vec<Pronunciation>,
}

impl Default for HttpAvatarConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            csrf_token: None,
            create_session_path: DEFAULT_CREATE_SESSION_PATH.to_string(),
            submit_text_path: DEFAULT_SUBMIT_TEXT_PATH.to_string(),
            stop_session_path: DEFAULT_STOP_SESSION_PATH.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            voice: AvatarVoice::default(),
            pronunciations: Vec::new(),
        }
    }
}

impl fmt::Debug for HttpAvatarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAvatarConfig")
            .field("base_url", &self.base_url)
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "<redacted>"))
            .field("create_session_path", &self.create_session_path)
            .field("submit_text_path", &self.submit_text_path)
            .field("stop_session_path", &self.stop_session_path)
            .field("request_timeout", &self.request_timeout)
            .field("voice", &self.voice)
            .field("pronunciations", &self.pronunciations.len())
            .finish()
    }
}

/// Event sender for the currently connected session
struct ConnectedSession {
    session_id: String,
    events: mpsc::UnboundedSender<RemoteEvent>,
}

/// Remote channel backed by the avatar session HTTP endpoints
pub struct HttpAvatarClient {
    client: reqwest::Client,
    base: Url,
    config: HttpAvatarConfig,
    pronunciation_replacer: PronunciationReplacer,
    connected: Mutex<Option<ConnectedSession>>,
    /// Request counter for logging
    request_counter: AtomicU64,
}

impl HttpAvatarClient {
    /// Create a new client. Fails when the base URL is not an absolute http(s) URL.
    pub fn new(config: HttpAvatarConfig) -> RemoteResult<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            RemoteError::InvalidConfiguration(format!(
                "Invalid avatar base URL '{}': {e}",
                config.base_url
            ))
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(RemoteError::InvalidConfiguration(format!(
                "Avatar base URL must use http or https, got '{}'",
                base.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                RemoteError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        let pronunciation_replacer = PronunciationReplacer::new(&config.pronunciations);

        Ok(Self {
            client,
            base,
            config,
            pronunciation_replacer,
            connected: Mutex::new(None),
            request_counter: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &HttpAvatarConfig {
        &self.config
    }

    /// Resolve an endpoint path against the base URL
    pub fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.base.join(path).map_err(|e| {
            RemoteError::InvalidConfiguration(format!("Invalid endpoint path '{path}': {e}"))
        })
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> RemoteResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let request_id = self.request_counter.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(request_id, %url, "POST avatar endpoint");

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(ref token) = self.config.csrf_token {
            request = request.header(CSRF_HEADER, token.as_str());
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            // The backend usually still answers with its JSON envelope
            let detail = serde_json::from_slice::<AckResponse>(&bytes)
                .ok()
                .and_then(|ack| ack.error)
                .unwrap_or_else(|| preview(&String::from_utf8_lossy(&bytes), 200).to_string());
            return Err(RemoteError::ProviderError(format!("HTTP {status}: {detail}")));
        }

        serde_json::from_slice::<R>(&bytes).map_err(|e| {
            RemoteError::InvalidResponse(format!("Failed to parse avatar response: {e}"))
        })
    }

    /// Push an error event to the open stream of `session_id`, if any
    fn report_connection_error(&self, session_id: &str, message: String) {
        let connected = self.connected.lock();
        if let Some(ref session) = *connected {
            if session.session_id == session_id {
                let _ = session.events.send(RemoteEvent::Error(message));
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::TimeoutError(e.to_string())
    } else if e.is_connect() {
        RemoteError::ConnectionFailed(e.to_string())
    } else {
        RemoteError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl RemoteChannel for HttpAvatarClient {
    async fn create_session(&self) -> RemoteResult<SessionInfo> {
        info!("Creating avatar session");
        let voice = &self.config.voice;
        let request = CreateSessionRequest {
            voice: VoiceSettings {
                voice_id: voice.voice_id.as_deref(),
                speed: voice.speed,
                emotion: &voice.emotion,
            },
        };
        let response: CreateSessionResponse = self
            .post_json(&self.config.create_session_path, &request)
            .await?;

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "session creation rejected".to_string());
            error!("Avatar session creation failed: {}", reason);
            return Err(RemoteError::ProviderError(reason));
        }

        let data = response.session_data.ok_or_else(|| {
            RemoteError::InvalidResponse("missing session_data in response".to_string())
        })?;
        if data.session_id.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "empty session_id in response".to_string(),
            ));
        }

        info!(session_id = %data.session_id, "Avatar session created");

        Ok(SessionInfo {
            session_id: data.session_id,
            auth_token: data.token,
            avatar_id: data.avatar_id,
            voice: AvatarVoice {
                voice_id: data.voice_id.or_else(|| self.config.voice.voice_id.clone()),
                speed: self.config.voice.speed,
                emotion: self.config.voice.emotion.clone(),
            },
        })
    }

    async fn connect(&self, session: &SessionInfo) -> RemoteResult<RemoteEvents> {
        if session.session_id.is_empty() {
            return Err(RemoteError::ConnectionFailed(
                "cannot connect without a session id".to_string(),
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        // The backend keeps the stream alive server-side; a provisioned
        // session is immediately usable.
        let _ = tx.send(RemoteEvent::Ready);

        let previous = self.connected.lock().replace(ConnectedSession {
            session_id: session.session_id.clone(),
            events: tx,
        });
        if let Some(previous) = previous {
            debug!(session_id = %previous.session_id, "Replacing previous avatar session stream");
        }

        info!(session_id = %session.session_id, "Avatar session connected");
        Ok(rx)
    }

    async fn submit_text(&self, session_id: &str, text: &str) -> RemoteResult<()> {
        let text = if self.pronunciation_replacer.is_empty() {
            text.to_string()
        } else {
            self.pronunciation_replacer.apply(text)
        };
        debug!(session_id, "Sending text to avatar: {}", preview(&text, 50));

        let result: RemoteResult<AckResponse> = self
            .post_json(
                &self.config.submit_text_path,
                &SubmitTextRequest {
                    session_id,
                    text: &text,
                },
            )
            .await;

        match result {
            Ok(ack) if ack.success => Ok(()),
            Ok(ack) => {
                let reason = ack.error.unwrap_or_else(|| "text rejected".to_string());
                warn!(session_id, "Avatar rejected text: {}", reason);
                Err(RemoteError::ProviderError(reason))
            }
            Err(e) => {
                if e.is_transport() {
                    self.report_connection_error(session_id, e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn stop_session(&self, session_id: &str) -> RemoteResult<()> {
        let ack: AckResponse = self
            .post_json(
                &self.config.stop_session_path,
                &StopSessionRequest { session_id },
            )
            .await?;

        if !ack.success {
            let reason = ack.error.unwrap_or_else(|| "stop rejected".to_string());
            return Err(RemoteError::ProviderError(reason));
        }

        let mut connected = self.connected.lock();
        if connected
            .as_ref()
            .is_some_and(|session| session.session_id == session_id)
        {
            // Dropping the sender closes the event stream
            connected.take();
        }

        info!(session_id, "Avatar session stopped");
        Ok(())
    }

    fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({
            "provider": "http-avatar",
            "version": "1.0.0",
            "api_type": "HTTP REST",
            "base_url": self.base.as_str(),
            "endpoints": {
                "create_session": self.config.create_session_path,
                "submit_text": self.config.submit_text_path,
                "stop_session": self.config.stop_session_path,
            },
            "voice": {
                "speed": self.config.voice.speed,
                "emotion": self.config.voice.emotion,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = HttpAvatarConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpAvatarClient::new(config),
            Err(RemoteError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let config = HttpAvatarConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            HttpAvatarClient::new(config),
            Err(RemoteError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_endpoint_resolution() {
        let client = HttpAvatarClient::new(HttpAvatarConfig {
            base_url: "https://cafes.example.com".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.endpoint(DEFAULT_CREATE_SESSION_PATH).unwrap().as_str(),
            "https://cafes.example.com/chat/avatar/crear-sesion/"
        );
        assert_eq!(
            client.endpoint(DEFAULT_STOP_SESSION_PATH).unwrap().as_str(),
            "https://cafes.example.com/chat/avatar/detener/"
        );
    }

    #[test]
    fn test_config_debug_redacts_csrf_token() {
        let config = HttpAvatarConfig {
            csrf_token: Some(Zeroizing::new("csrf-secret".to_string())),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("csrf-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_connect_emits_ready() {
        let client = HttpAvatarClient::new(HttpAvatarConfig::default()).unwrap();
        let session = SessionInfo::new("sess-1", "tok");
        let mut events = client.connect(&session).await.unwrap();
        assert_eq!(events.recv().await, Some(RemoteEvent::Ready));
    }

    #[tokio::test]
    async fn test_connect_requires_session_id() {
        let client = HttpAvatarClient::new(HttpAvatarConfig::default()).unwrap();
        let session = SessionInfo::new("", "tok");
        assert!(client.connect(&session).await.is_err());
    }

    #[test]
    fn test_provider_info() {
        let client = HttpAvatarClient::new(HttpAvatarConfig::default()).unwrap();
        let info = client.get_provider_info();
        assert_eq!(info["provider"], "http-avatar");
        assert_eq!(info["endpoints"]["submit_text"], DEFAULT_SUBMIT_TEXT_PATH);
    }
}
