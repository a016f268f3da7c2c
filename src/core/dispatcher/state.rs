//! State management for SpeechDispatcher

use super::errors::SpeechError;

/// Externally observable lifecycle of the remote channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Disconnected,
    Connecting,
    Connected { speaking: bool },
}

/// Session bookkeeping shared between the dispatcher and its event pump.
///
/// Guarded by a `parking_lot::Mutex` that is never held across an await.
#[derive(Debug, Default)]
pub struct SessionState {
    /// A session is being provisioned
    pub connecting: bool,
    /// Remote channel can accept text
    pub connected: bool,
    /// Remote avatar is speaking
    pub speaking: bool,
    pub session_id: Option<String>,
    /// Bumped every time a session identity is discarded; events tagged with
    /// an older generation are ignored
    pub generation: u64,
    pub last_error: Option<SpeechError>,
}

impl SessionState {
    pub fn state(&self) -> DispatcherState {
        if self.connecting {
            DispatcherState::Connecting
        } else if self.connected {
            DispatcherState::Connected {
                speaking: self.speaking,
            }
        } else {
            DispatcherState::Disconnected
        }
    }

    /// Forget the current session and start a new generation.
    ///
    /// Returns the new generation.
    pub fn discard_session(&mut self) -> u64 {
        self.generation += 1;
        self.connecting = false;
        self.connected = false;
        self.speaking = false;
        self.session_id = None;
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_projection() {
        let mut state = SessionState::default();
        assert_eq!(state.state(), DispatcherState::Disconnected);

        state.connecting = true;
        assert_eq!(state.state(), DispatcherState::Connecting);

        state.connecting = false;
        state.connected = true;
        state.speaking = true;
        assert_eq!(state.state(), DispatcherState::Connected { speaking: true });
    }

    #[test]
    fn test_discard_session_bumps_generation() {
        let mut state = SessionState {
            connected: true,
            speaking: true,
            session_id: Some("sess-1".to_string()),
            ..Default::default()
        };
        assert_eq!(state.discard_session(), 1);
        assert!(!state.connected);
        assert!(!state.speaking);
        assert!(state.session_id.is_none());
        assert_eq!(state.discard_session(), 2);
    }
}
