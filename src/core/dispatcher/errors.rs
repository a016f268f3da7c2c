//! Error types for SpeechDispatcher operations

use crate::core::remote::RemoteError;

/// Failures observed by the dispatcher.
///
/// None of these escape `dispatch`; they are recorded as the dispatcher's
/// last error and surfaced as status notifications.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpeechError {
    #[error("Session provisioning failed: {0}")]
    Provisioning(RemoteError),
    #[error("Remote connection error: {0}")]
    Connection(String),
    #[error("Text submission failed: {0}")]
    Submission(RemoteError),
    #[error("Session teardown failed: {0}")]
    Teardown(RemoteError),
    #[error("No remote channel configured")]
    NotConfigured,
}

/// Result type for SpeechDispatcher operations
pub type SpeechResult<T> = Result<T, SpeechError>;
