//! Wire types for the avatar session backend.
//!
//! Every endpoint answers with a JSON envelope carrying a `success` flag and
//! either a payload or an `error` string.

use serde::{Deserialize, Serialize};

/// Session payload returned by the create-session endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SessionData {
    pub session_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Response of the create-session endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub success: bool,
    #[serde(default)]
    pub session_data: Option<SessionData>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the submit-text and stop-session endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Voice block of the create-session request
#[derive(Debug, Clone, Serialize)]
pub struct VoiceSettings<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<&'a str>,
    pub speed: f32,
    pub emotion: &'a str,
}

/// Request body for the create-session endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest<'a> {
    pub voice: VoiceSettings<'a>,
}

/// Request body for the submit-text endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SubmitTextRequest<'a> {
    pub session_id: &'a str,
    pub text: &'a str,
}

/// Request body for the stop-session endpoint
#[derive(Debug, Clone, Serialize)]
pub struct StopSessionRequest<'a> {
    pub session_id: &'a str,
}
