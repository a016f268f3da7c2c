//! Remote avatar speech channel.
//!
//! [`RemoteChannel`] is the narrow interface the dispatcher drives; the
//! [`HttpAvatarClient`] implements it against the avatar session backend.

mod base;
mod http;
mod messages;

pub use base::{
    AvatarVoice, RemoteChannel, RemoteError, RemoteEvent, RemoteEvents, RemoteResult, SessionInfo,
};
pub use http::{
    CSRF_HEADER, DEFAULT_CREATE_SESSION_PATH, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STOP_SESSION_PATH, DEFAULT_SUBMIT_TEXT_PATH, HttpAvatarClient, HttpAvatarConfig,
};
