//! espeak-ng local synthesis engine.
//!
//! Speaks through the `espeak-ng` (or legacy `espeak`) command line tool,
//! which plays audio directly on the default output device. Text is fed on
//! stdin so it is never interpreted as command line flags.
//!
//! Env overrides (resolved by the configuration layer):
//! - ESPEAK_BIN
//! - VOICE_RATE, VOICE_PITCH, VOICE_VOLUME

use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::base::{
    LocalError, LocalResult, LocalSpeechChannel, UtteranceEvent, UtteranceEvents, VoiceInfo,
    VoiceSelector,
};
use crate::core::pronunciation::{Pronunciation, PronunciationReplacer};
use crate::core::sanitize::preview;

/// espeak's default speaking speed in words per minute
const ESPEAK_BASE_WPM: f32 = 175.0;
/// espeak's default pitch (0-99)
const ESPEAK_BASE_PITCH: f32 = 50.0;
/// espeak's default amplitude (0-200)
const ESPEAK_BASE_AMPLITUDE: f32 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EspeakConfig {
    /// Explicit binary path; searched on PATH when absent
    pub bin: Option<PathBuf>,
    /// Speaking rate multiplier (1.0 is normal)
    pub rate: f32,
    /// Pitch multiplier (1.0 is normal)
    pub pitch: f32,
    /// Volume multiplier (1.0 is normal)
    pub volume: f32,
    pub pronunciations: Vec<Pronunciation>,
}

impl Default for EspeakConfig {
    fn default() -> Self {
        Self {
            bin: None,
            rate: 0.9,
            pitch: 1.0,
            volume: 1.0,
            pronunciations: Vec::new(),
        }
    }
}

fn find_in_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        let p = PathBuf::from(bin);
        return if p.exists() { Some(p) } else { None };
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(bin))
        .find(|candidate| candidate.is_file())
}

/// Locate the espeak binary: explicit path first, then `espeak-ng`, then `espeak`.
pub fn locate_espeak(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        warn!(path = ?path, "Configured espeak binary not found, searching PATH");
    }
    find_in_path("espeak-ng").or_else(|| find_in_path("espeak"))
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  es              --/M      Spanish_(Spain)    roa/es
/// ```
pub fn parse_voice_list(output: &str) -> Vec<VoiceInfo> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _priority = cols.next()?;
            let language = cols.next()?;
            let age_gender = cols.next()?;
            let name = cols.next()?;
            let gender = age_gender
                .rsplit('/')
                .next()
                .filter(|g| !g.is_empty() && *g != "-" && *g != "--")
                .map(str::to_string);
            Some(VoiceInfo {
                id: language.to_string(),
                name: name.replace('_', " "),
                language: language.to_string(),
                gender,
            })
        })
        .collect()
}

/// Build espeak arguments for one utterance
fn build_args(config: &EspeakConfig, voice: Option<&str>) -> Vec<String> {
    let wpm = (ESPEAK_BASE_WPM * config.rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (ESPEAK_BASE_PITCH * config.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (ESPEAK_BASE_AMPLITUDE * config.volume)
        .round()
        .clamp(0.0, 200.0) as u32;

    let mut args = vec![
        "--stdin".to_string(),
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
    ];
    if let Some(voice) = voice {
        args.push("-v".to_string());
        args.push(voice.to_string());
    }
    args
}

/// Local speech channel driving the espeak-ng CLI
pub struct EspeakChannel {
    config: EspeakConfig,
    bin: Option<PathBuf>,
    voices: OnceCell<Vec<VoiceInfo>>,
    current: Mutex<Option<JoinHandle<()>>>,
    pronunciation_replacer: PronunciationReplacer,
}

impl EspeakChannel {
    pub fn new(config: EspeakConfig) -> Self {
        let bin = locate_espeak(config.bin.as_deref());
        match bin {
            Some(ref p) => info!(bin = ?p, "Detected espeak binary"),
            None => warn!("No espeak binary found; local voice unavailable"),
        }
        let pronunciation_replacer = PronunciationReplacer::new(&config.pronunciations);

        // Listing voices runs the engine synchronously; do it here so speak()
        // never blocks an async worker
        let voices = OnceCell::new();
        if let Some(ref p) = bin {
            let _ = voices.set(Self::load_voices(p));
        }

        Self {
            config,
            bin,
            voices,
            current: Mutex::new(None),
            pronunciation_replacer,
        }
    }

    pub fn binary(&self) -> Option<&Path> {
        self.bin.as_deref()
    }

    fn load_voices(bin: &Path) -> Vec<VoiceInfo> {
        match StdCommand::new(bin)
            .arg("--voices")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
        {
            Ok(output) if output.status.success() => {
                parse_voice_list(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!(status = %output.status, "espeak --voices failed");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to list espeak voices");
                Vec::new()
            }
        }
    }
}

impl LocalSpeechChannel for EspeakChannel {
    fn is_available(&self) -> bool {
        self.bin.is_some()
    }

    fn voices(&self) -> Vec<VoiceInfo> {
        match self.bin {
            Some(ref bin) => self.voices.get_or_init(|| Self::load_voices(bin)).clone(),
            None => Vec::new(),
        }
    }

    fn speak(&self, text: &str, selector: &VoiceSelector) -> LocalResult<UtteranceEvents> {
        let bin = self
            .bin
            .as_ref()
            .ok_or_else(|| LocalError::EngineUnavailable("espeak-ng not found".to_string()))?;
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(LocalError::EngineUnavailable(
                "no async runtime to drive the speech engine".to_string(),
            ));
        }

        // Only one utterance at a time
        self.cancel();

        let text = if self.pronunciation_replacer.is_empty() {
            text.to_string()
        } else {
            self.pronunciation_replacer.apply(text)
        };
        let voices = self.voices();
        let voice = selector.select(&voices).map(|v| v.id.clone());
        let args = build_args(&self.config, voice.as_deref());

        let mut child = Command::new(bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LocalError::SpawnFailed(e.to_string()))?;

        let utterance_id = Uuid::new_v4();
        info!(%utterance_id, voice = ?voice, "Speaking locally: {}", preview(&text, 50));

        let stdin = child.stdin.take();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let _ = tx.send(UtteranceEvent::Start);

            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(text.as_bytes()).await {
                    let _ = tx.send(UtteranceEvent::Error(format!(
                        "failed to write text to speech engine: {e}"
                    )));
                    return;
                }
                // Closing stdin lets espeak finish
                drop(stdin);
            }

            match child.wait_with_output().await {
                Ok(output) if output.status.success() => {
                    debug!(%utterance_id, "Local utterance finished");
                    let _ = tx.send(UtteranceEvent::End);
                }
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    let _ = tx.send(UtteranceEvent::Error(format!(
                        "speech engine exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )));
                }
                Err(e) => {
                    let _ = tx.send(UtteranceEvent::Error(e.to_string()));
                }
            }
        });

        *self.current.lock() = Some(handle);
        Ok(rx)
    }

    fn cancel(&self) {
        if let Some(handle) = self.current.lock().take() {
            if !handle.is_finished() {
                debug!("Cancelling current local utterance");
            }
            // Dropping the child inside the aborted task kills the process
            handle.abort();
        }
    }

    fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({
            "provider": "espeak-ng",
            "version": "1.0.0",
            "available": self.is_available(),
            "binary": self.bin.as_ref().map(|p| p.display().to_string()),
            "rate": self.config.rate,
            "pitch": self.config.pitch,
            "volume": self.config.volume,
        })
    }
}

impl Drop for EspeakChannel {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICES_OUTPUT: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
 5  es              --/M      Spanish_(Spain)    roa/es
 5  es-419          --/F      Spanish_(Latin_America) roa/es-419      (es-mx 6)
";

    #[test]
    fn test_parse_voice_list() {
        let voices = parse_voice_list(VOICES_OUTPUT);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[2].id, "es");
        assert_eq!(voices[2].name, "Spanish (Spain)");
        assert_eq!(voices[2].gender.as_deref(), Some("M"));
        assert_eq!(voices[3].language, "es-419");
        assert_eq!(voices[3].gender.as_deref(), Some("F"));
    }

    #[test]
    fn test_parse_voice_list_ignores_short_lines() {
        let voices = parse_voice_list("header\n\n 5 es\n");
        assert!(voices.is_empty());
    }

    #[test]
    fn test_selector_against_parsed_voices() {
        let voices = parse_voice_list(VOICES_OUTPUT);
        let selector = VoiceSelector::locale("es").with_name_hint("Spanish");
        assert_eq!(selector.select(&voices).unwrap().id, "es");
    }

    #[test]
    fn test_build_args_defaults() {
        let args = build_args(&EspeakConfig::default(), Some("es"));
        assert_eq!(
            args,
            vec!["--stdin", "-s", "158", "-p", "50", "-a", "100", "-v", "es"]
        );
    }

    #[test]
    fn test_build_args_clamps_and_omits_voice() {
        let config = EspeakConfig {
            rate: 10.0,
            pitch: 3.0,
            volume: 0.0,
            ..Default::default()
        };
        let args = build_args(&config, None);
        assert_eq!(args, vec!["--stdin", "-s", "450", "-p", "99", "-a", "0"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_voices_are_listed_at_construction() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("espeak-ng");
        let listing = dir.path().join("voices.txt");
        std::fs::write(&listing, VOICES_OUTPUT).unwrap();
        std::fs::write(
            &script,
            format!("#!/bin/sh\ncat '{}'\n", listing.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let channel = EspeakChannel::new(EspeakConfig {
            bin: Some(script.clone()),
            ..Default::default()
        });

        assert_eq!(channel.binary(), Some(script.as_path()));
        let cached = channel.voices.get().expect("voices listed in new()");
        assert_eq!(cached.len(), 4);
        assert_eq!(channel.voices(), *cached);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let channel = EspeakChannel {
            config: EspeakConfig::default(),
            bin: None,
            voices: OnceCell::new(),
            current: Mutex::new(None),
            pronunciation_replacer: PronunciationReplacer::default(),
        };
        assert!(!channel.is_available());
        assert!(channel.voices().is_empty());
        assert!(matches!(
            channel.speak("hola", &VoiceSelector::default()),
            Err(LocalError::EngineUnavailable(_))
        ));
    }
}
