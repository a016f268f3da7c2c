//! Speech dispatcher: remote avatar first, local voice as fallback.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::errors::SpeechError;
use super::state::{DispatcherState, SessionState};
use crate::core::local::{
    LocalError, LocalSpeechChannel, UtteranceEvent, UtteranceEvents, VoiceSelector,
};
use crate::core::remote::{RemoteChannel, RemoteEvent, RemoteEvents};
use crate::core::sanitize::{preview, sanitize};
use crate::core::status::{ChannelStatus, StatusSink, StatusUpdate, text};

/// Configuration for the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Voice preference handed to the local channel
    pub voice_selector: VoiceSelector,
    /// Whether the local channel may be used at all
    pub local_fallback: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            voice_selector: VoiceSelector::locale("es").with_name_hint("Spanish"),
            local_fallback: true,
        }
    }
}

/// Where a dispatched text ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Accepted by the remote avatar
    Remote,
    /// Handed to the local voice
    Local,
    /// Nothing speakable after sanitizing
    Empty,
    /// Remote unusable and no local voice available
    LocalUnavailable,
    /// The local voice refused the utterance
    LocalFailed,
}

/// Result of a teardown request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    NoSession,
    Stopped,
    /// Teardown failed; session state is intact and the call may be retried
    Failed,
}

/// Routes text to the remote avatar channel with automatic local fallback.
///
/// Each dispatcher owns exactly one session. Lifecycle calls and `dispatch`
/// are serialized; remote events are applied by a background pump.
pub struct SpeechDispatcher {
    remote: Option<Arc<dyn RemoteChannel>>,
    local: Arc<dyn LocalSpeechChannel>,
    sink: Arc<dyn StatusSink>,
    config: DispatcherConfig,
    state: Arc<Mutex<SessionState>>,
    gate: tokio::sync::Mutex<()>,
    pump: Mutex<Option<JoinHandle<()>>>,
    watchers: Mutex<Vec<JoinHandle<()>>>,
}

impl SpeechDispatcher {
    pub fn new(
        remote: Option<Arc<dyn RemoteChannel>>,
        local: Arc<dyn LocalSpeechChannel>,
        sink: Arc<dyn StatusSink>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            remote,
            local,
            sink,
            config,
            state: Arc::new(Mutex::new(SessionState::default())),
            gate: tokio::sync::Mutex::new(()),
            pump: Mutex::new(None),
            watchers: Mutex::new(Vec::new()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn is_speaking(&self) -> bool {
        self.state.lock().speaking
    }

    pub fn session_id(&self) -> Option<String> {
        self.state.lock().session_id.clone()
    }

    pub fn state(&self) -> DispatcherState {
        self.state.lock().state()
    }

    pub fn last_error(&self) -> Option<SpeechError> {
        self.state.lock().last_error.clone()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Provision and connect a remote session.
    ///
    /// Returns whether the remote channel is now connected. Failures are
    /// reported to the status sink and recorded as the last error; a previous
    /// session is discarded without teardown.
    pub async fn init_remote_channel(&self) -> bool {
        let _gate = self.gate.lock().await;

        let Some(remote) = self.remote.clone() else {
            warn!("Remote channel requested but none is configured");
            self.record_error(SpeechError::NotConfigured);
            self.notify(StatusUpdate::avatar(
                ChannelStatus::Error,
                text::AVATAR_NOT_CONFIGURED,
            ));
            return false;
        };

        let generation = {
            let mut state = self.state.lock();
            if let Some(ref previous) = state.session_id {
                warn!(session_id = %previous, "Discarding previous avatar session");
            }
            let generation = state.discard_session();
            state.connecting = true;
            generation
        };
        self.stop_pump();
        self.notify(StatusUpdate::avatar(
            ChannelStatus::Connecting,
            text::AVATAR_CONNECTING,
        ));

        let session = match remote.create_session().await {
            Ok(session) => session,
            Err(e) => {
                error!("Error creating avatar session: {}", e);
                self.fail_init(SpeechError::Provisioning(e), text::AVATAR_SESSION_ERROR);
                return false;
            }
        };

        let events = match remote.connect(&session).await {
            Ok(events) => events,
            Err(e) => {
                error!(session_id = %session.session_id, "Error connecting avatar: {}", e);
                // Keep the id so the provisioned session can still be torn down
                self.state.lock().session_id = Some(session.session_id.clone());
                self.fail_init(SpeechError::Connection(e.to_string()), text::AVATAR_INIT_ERROR);
                return false;
            }
        };

        {
            let mut state = self.state.lock();
            state.connecting = false;
            state.connected = true;
            state.session_id = Some(session.session_id.clone());
            state.last_error = None;
        }
        self.spawn_pump(generation, events);

        info!(session_id = %session.session_id, "Avatar channel connected");
        self.notify(StatusUpdate::avatar(
            ChannelStatus::Ready,
            text::AVATAR_CONNECTED,
        ));
        true
    }

    /// Speak `text`, preferring the remote avatar.
    ///
    /// Never fails: every failure degrades to the local voice or to a no-op,
    /// with a status notification at each transition.
    pub async fn dispatch(&self, text: &str) -> DispatchOutcome {
        self.sink.speaking_intent(true);
        let _gate = self.gate.lock().await;
        debug!("Dispatching text: {}", preview(text, 50));

        let target = {
            let state = self.state.lock();
            if state.connected {
                state.session_id.clone()
            } else {
                None
            }
        };

        if let (Some(session_id), Some(remote)) = (target, self.remote.as_ref()) {
            let clean = sanitize(text);
            if clean.is_empty() {
                debug!("Text has no speakable content, skipping avatar");
                self.sink.speaking_intent(false);
                return DispatchOutcome::Empty;
            }

            match remote.submit_text(&session_id, &clean).await {
                Ok(()) => {
                    debug!(session_id = %session_id, "Text accepted by avatar");
                    return DispatchOutcome::Remote;
                }
                Err(e) => {
                    error!(session_id = %session_id, "Error sending text to avatar: {}", e);
                    self.record_error(SpeechError::Submission(e));
                    self.notify(StatusUpdate::avatar(
                        ChannelStatus::Error,
                        text::AVATAR_SUBMIT_ERROR,
                    ));
                    self.notify(StatusUpdate::voice(
                        ChannelStatus::Idle,
                        text::VOICE_FALLBACK,
                    ));
                }
            }
        }

        self.speak_locally(text)
    }

    /// Tear down the current remote session.
    pub async fn stop_remote_channel(&self) -> StopOutcome {
        let _gate = self.gate.lock().await;

        let session_id = self.state.lock().session_id.clone();
        let (Some(session_id), Some(remote)) = (session_id, self.remote.as_ref()) else {
            debug!("No avatar session to stop");
            return StopOutcome::NoSession;
        };

        match remote.stop_session(&session_id).await {
            Ok(()) => {
                self.state.lock().discard_session();
                self.stop_pump();
                info!(session_id = %session_id, "Avatar channel stopped");
                self.notify(StatusUpdate::avatar(
                    ChannelStatus::Stopped,
                    text::AVATAR_STOPPED,
                ));
                StopOutcome::Stopped
            }
            Err(e) => {
                error!(session_id = %session_id, "Error stopping avatar: {}", e);
                self.record_error(SpeechError::Teardown(e));
                self.notify(StatusUpdate::avatar(
                    ChannelStatus::Error,
                    text::AVATAR_STOP_ERROR,
                ));
                StopOutcome::Failed
            }
        }
    }

    fn speak_locally(&self, text: &str) -> DispatchOutcome {
        let clean = sanitize(text);
        if clean.is_empty() {
            debug!("Text has no speakable content after sanitizing");
            self.sink.speaking_intent(false);
            return DispatchOutcome::Empty;
        }

        if !self.config.local_fallback || !self.local.is_available() {
            warn!("Local voice not available");
            return self.local_unavailable();
        }

        debug!("Speaking with local voice: {}", preview(&clean, 50));
        // The engine replaces any current utterance; its watcher goes with it
        self.stop_watchers();
        match self.local.speak(&clean, &self.config.voice_selector) {
            Ok(events) => {
                self.spawn_watcher(events);
                DispatchOutcome::Local
            }
            Err(LocalError::EngineUnavailable(reason)) => {
                warn!("Local voice unavailable: {}", reason);
                self.local_unavailable()
            }
            Err(e) => {
                error!("Local voice failed: {}", e);
                self.notify(StatusUpdate::voice(ChannelStatus::Error, text::VOICE_ERROR));
                self.sink.speaking_intent(false);
                DispatchOutcome::LocalFailed
            }
        }
    }

    fn local_unavailable(&self) -> DispatchOutcome {
        self.notify(StatusUpdate::voice(
            ChannelStatus::Error,
            text::VOICE_UNAVAILABLE,
        ));
        self.sink.speaking_intent(false);
        DispatchOutcome::LocalUnavailable
    }

    fn fail_init(&self, error: SpeechError, status_text: &str) {
        {
            let mut state = self.state.lock();
            state.connecting = false;
            state.connected = false;
            state.last_error = Some(error);
        }
        self.notify(StatusUpdate::avatar(ChannelStatus::Error, status_text));
    }

    fn record_error(&self, error: SpeechError) {
        self.state.lock().last_error = Some(error);
    }

    fn notify(&self, update: StatusUpdate) {
        self.sink.notify(&update);
    }

    fn spawn_pump(&self, generation: u64, mut events: RemoteEvents) {
        let state = self.state.clone();
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                apply_remote_event(&state, sink.as_ref(), generation, event);
            }
            debug!(generation, "Avatar event stream closed");
        });
        if let Some(previous) = self.pump.lock().replace(handle) {
            previous.abort();
        }
    }

    fn stop_watchers(&self) {
        for watcher in self.watchers.lock().drain(..) {
            watcher.abort();
        }
    }

    fn stop_pump(&self) {
        if let Some(handle) = self.pump.lock().take() {
            handle.abort();
        }
    }

    fn spawn_watcher(&self, mut events: UtteranceEvents) {
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            let mut finished = false;
            while let Some(event) = events.recv().await {
                match event {
                    UtteranceEvent::Start => {
                        sink.notify(&StatusUpdate::voice(
                            ChannelStatus::Speaking,
                            text::VOICE_PLAYING,
                        ));
                        sink.speaking_intent(true);
                    }
                    UtteranceEvent::End => {
                        sink.notify(&StatusUpdate::voice(
                            ChannelStatus::Ready,
                            text::VOICE_READY,
                        ));
                        sink.speaking_intent(false);
                        finished = true;
                        break;
                    }
                    UtteranceEvent::Error(reason) => {
                        warn!("Local utterance failed: {}", reason);
                        sink.notify(&StatusUpdate::voice(
                            ChannelStatus::Error,
                            text::VOICE_ERROR,
                        ));
                        sink.speaking_intent(false);
                        finished = true;
                        break;
                    }
                }
            }

            // Engine dropped the utterance without a terminal event
            if !finished {
                warn!("Local utterance ended without completing");
                sink.notify(&StatusUpdate::voice(
                    ChannelStatus::Error,
                    text::VOICE_ERROR,
                ));
                sink.speaking_intent(false);
            }
        });

        let mut watchers = self.watchers.lock();
        watchers.retain(|watcher| !watcher.is_finished());
        watchers.push(handle);
    }
}

/// Apply one remote event to the session it was emitted for.
fn apply_remote_event(
    state: &Mutex<SessionState>,
    sink: &dyn StatusSink,
    generation: u64,
    event: RemoteEvent,
) {
    let update = {
        let mut state = state.lock();
        if state.generation != generation {
            debug!(
                generation,
                current = state.generation,
                "Ignoring event from discarded avatar session"
            );
            return;
        }

        match event {
            RemoteEvent::Ready => {
                state.connecting = false;
                state.connected = true;
                StatusUpdate::avatar(ChannelStatus::Ready, text::AVATAR_READY)
            }
            RemoteEvent::SpeakingStart => {
                state.speaking = true;
                StatusUpdate::avatar(ChannelStatus::Speaking, text::AVATAR_SPEAKING)
            }
            RemoteEvent::SpeakingEnd => {
                state.speaking = false;
                StatusUpdate::avatar(ChannelStatus::Ready, text::AVATAR_READY)
            }
            RemoteEvent::Error(reason) => {
                warn!("Avatar connection error: {}", reason);
                state.connected = false;
                state.speaking = false;
                state.last_error = Some(SpeechError::Connection(reason));
                StatusUpdate::avatar(ChannelStatus::Error, text::AVATAR_ERROR)
            }
        }
    };
    sink.notify(&update);
}

impl Drop for SpeechDispatcher {
    fn drop(&mut self) {
        self.stop_pump();
        self.stop_watchers();
    }
}
