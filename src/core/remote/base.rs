//! # Remote Channel Base Trait
//!
//! Abstraction over the remote avatar speech service. The service provisions a
//! session, accepts text for a live session, tears the session down, and emits
//! asynchronous events while the avatar is connected.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use speech_dispatch::core::remote::{RemoteChannel, RemoteEvent};
//!
//! async fn example(channel: &dyn RemoteChannel) -> Result<(), RemoteError> {
//!     let session = channel.create_session().await?;
//!     let mut events = channel.connect(&session).await?;
//!
//!     channel.submit_text(&session.session_id, "Hola, bienvenido").await?;
//!
//!     while let Some(event) = events.recv().await {
//!         if event == RemoteEvent::SpeakingEnd {
//!             break;
//!         }
//!     }
//!
//!     channel.stop_session(&session.session_id).await
//! }
//! ```

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use zeroize::Zeroize;

/// Remote channel error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Session not connected: {0}")]
    NotConnected(String),
}

impl RemoteError {
    /// Whether the failure happened below the application protocol, meaning
    /// the live connection itself is likely gone.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RemoteError::ConnectionFailed(_)
                | RemoteError::NetworkError(_)
                | RemoteError::TimeoutError(_)
        )
    }
}

/// Result type for remote channel operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Voice parameters the avatar speaks with
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarVoice {
    pub voice_id: Option<String>,
    /// Speaking speed (1.0 is normal)
    pub speed: f32,
    /// Emotion preset passed through to the avatar service
    pub emotion: String,
}

impl Default for AvatarVoice {
    fn default() -> Self {
        Self {
            voice_id: None,
            speed: 1.0,
            emotion: "friendly".to_string(),
        }
    }
}

/// A provisioned remote session
#[derive(Clone)]
pub struct SessionInfo {
    /// Opaque session identifier
    pub session_id: String,
    /// Access token for the streaming connection
    pub auth_token: String,
    /// Avatar identity chosen by the service
    pub avatar_id: Option<String>,
    pub voice: AvatarVoice,
}

impl SessionInfo {
    pub fn new(session_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            auth_token: auth_token.into(),
            avatar_id: None,
            voice: AvatarVoice::default(),
        }
    }
}

impl fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInfo")
            .field("session_id", &self.session_id)
            .field("auth_token", &"<redacted>")
            .field("avatar_id", &self.avatar_id)
            .field("voice", &self.voice)
            .finish()
    }
}

impl Drop for SessionInfo {
    fn drop(&mut self) {
        self.auth_token.zeroize();
    }
}

/// Asynchronous signals emitted by a connected remote channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// The avatar finished loading and can speak
    Ready,
    /// The avatar started speaking submitted text
    SpeakingStart,
    /// The avatar finished speaking
    SpeakingEnd,
    /// The connection failed; the session can no longer speak
    Error(String),
}

/// Stream of events for one connected session
pub type RemoteEvents = mpsc::UnboundedReceiver<RemoteEvent>;

/// Base trait for remote avatar speech services
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Request a new session from the provisioning service.
    ///
    /// # Returns
    /// * `RemoteResult<SessionInfo>` - The provisioned session or a provisioning error
    async fn create_session(&self) -> RemoteResult<SessionInfo>;

    /// Open the live connection for a provisioned session.
    ///
    /// The returned receiver yields `Ready`, `SpeakingStart`, `SpeakingEnd` and
    /// `Error` events until the session is stopped or the sender side is dropped.
    async fn connect(&self, session: &SessionInfo) -> RemoteResult<RemoteEvents>;

    /// Submit text for the avatar to speak.
    ///
    /// Resolves once the service accepted or rejected the text; speaking
    /// progress is reported through the event stream.
    async fn submit_text(&self, session_id: &str, text: &str) -> RemoteResult<()>;

    /// Tear down a session.
    async fn stop_session(&self, session_id: &str) -> RemoteResult<()>;

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

    #[test]
    fn test_session_debug_redacts_token() {
        let session = SessionInfo::new("sess-1", "super-secret");
        let debug = format!("{session:?}");
        assert!(debug.contains("sess-1"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(RemoteError::NetworkError("reset".into()).is_transport());
        assert!(RemoteError::TimeoutError("slow".into()).is_transport());
        assert!(!RemoteError::ProviderError("rejected".into()).is_transport());
        assert!(!RemoteError::InvalidResponse("bad json".into()).is_transport());
    }

    #[test]
    fn test_avatar_voice_defaults() {
        let voice = AvatarVoice::default();
        assert_eq!(voice.speed, 1.0);
        assert_eq!(voice.emotion, "friendly");
        assert!(voice.voice_id.is_none());
    }
}
