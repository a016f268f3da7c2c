pub mod dispatcher;
pub mod local;
pub mod pronunciation;
pub mod remote;
pub mod sanitize;
pub mod status;

// Re-export commonly used types for convenience
pub use dispatcher::{
    DispatchOutcome, DispatcherConfig, DispatcherState, SpeechDispatcher, SpeechError,
    SpeechResult, StopOutcome,
};

pub use local::{
    EspeakChannel, EspeakConfig, LocalError, LocalResult, LocalSpeechChannel, UtteranceEvent,
    UtteranceEvents, VoiceInfo, VoiceSelector,
};

pub use remote::{
    AvatarVoice, HttpAvatarClient, HttpAvatarConfig, RemoteChannel, RemoteError, RemoteEvent,
    RemoteEvents, RemoteResult, SessionInfo,
};

pub use pronunciation::{Pronunciation, PronunciationReplacer};
pub use sanitize::sanitize;
pub use status::{ChannelStatus, StatusSink, StatusTarget, StatusUpdate, TracingStatusSink};
