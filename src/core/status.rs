//! Status notifications for the presentation layer.
//!
//! The dispatcher only ever writes to a [`StatusSink`]; it never reads UI state.

use std::fmt;

use tracing::{info, warn};

/// Observable status of a speech channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelStatus {
    Idle,
    Connecting,
    Ready,
    Speaking,
    Error,
    Stopped,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Idle => "idle",
            ChannelStatus::Connecting => "connecting",
            ChannelStatus::Ready => "ready",
            ChannelStatus::Speaking => "speaking",
            ChannelStatus::Error => "error",
            ChannelStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which status indicator an update is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTarget {
    /// The remote avatar channel
    Avatar,
    /// The local synthesis voice
    Voice,
}

impl StatusTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTarget::Avatar => "avatar",
            StatusTarget::Voice => "voice",
        }
    }
}

/// Status texts shown to the user
pub mod text {
    pub const AVATAR_CONNECTING: &str = "Connecting avatar...";
    pub const AVATAR_CONNECTED: &str = "Avatar connected";
    pub const AVATAR_SPEAKING: &str = "Avatar speaking...";
    pub const AVATAR_READY: &str = "Avatar ready";
    pub const AVATAR_ERROR: &str = "Avatar error";
    pub const AVATAR_NOT_CONFIGURED: &str = "Avatar not configured";
    pub const AVATAR_SESSION_ERROR: &str = "Error creating avatar";
    pub const AVATAR_INIT_ERROR: &str = "Error initializing avatar";
    pub const AVATAR_SUBMIT_ERROR: &str = "Error sending text to avatar";
    pub const AVATAR_STOPPED: &str = "Avatar stopped";
    pub const AVATAR_STOP_ERROR: &str = "Error stopping avatar";
    pub const VOICE_FALLBACK: &str = "Using local voice";
    pub const VOICE_PLAYING: &str = "Playing...";
    pub const VOICE_READY: &str = "Local voice ready";
    pub const VOICE_ERROR: &str = "Voice error";
    pub const VOICE_UNAVAILABLE: &str = "Voice unavailable";
}

/// A single status notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub target: StatusTarget,
    pub status: ChannelStatus,
    pub text: String,
}

impl StatusUpdate {
    pub fn new(target: StatusTarget, status: ChannelStatus, text: impl Into<String>) -> Self {
        Self {
            target,
            status,
            text: text.into(),
        }
    }

    pub fn avatar(status: ChannelStatus, text: impl Into<String>) -> Self {
        Self::new(StatusTarget::Avatar, status, text)
    }

    pub fn voice(status: ChannelStatus, text: impl Into<String>) -> Self {
        Self::new(StatusTarget::Voice, status, text)
    }
}

/// One-way notification interface consumed by the presentation layer
pub trait StatusSink: Send + Sync {
    /// Called on every status transition
    fn notify(&self, update: &StatusUpdate);

    /// Called when speech is about to start (`true`) or has finished (`false`).
    ///
    /// Fire-and-forget; implementations must not block.
    fn speaking_intent(&self, _speaking: bool) {}
}

/// Status sink that writes updates to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatusSink;

impl StatusSink for TracingStatusSink {
    fn notify(&self, update: &StatusUpdate) {
        match update.status {
            ChannelStatus::Error => warn!(
                target: "speech_status",
                channel = update.target.as_str(),
                status = %update.status,
                "{}",
                update.text
            ),
            _ => info!(
                target: "speech_status",
                channel = update.target.as_str(),
                status = %update.status,
                "{}",
                update.text
            ),
        }
    }

    fn speaking_intent(&self, speaking: bool) {
        tracing::debug!(target: "speech_status", speaking, "speaking intent");
    }
}
