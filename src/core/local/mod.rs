//! Local (on-device) speech fallback.

mod base;
mod espeak;

pub use base::{
    LocalError, LocalResult, LocalSpeechChannel, UtteranceEvent, UtteranceEvents, VoiceInfo,
    VoiceSelector,
};
pub use espeak::{EspeakChannel, EspeakConfig, locate_espeak, parse_voice_list};
