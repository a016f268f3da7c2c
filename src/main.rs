use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tokio::sync::Notify;
use tracing::{info, warn};

use speech_dispatch::{
    ChannelStatus, DispatchOutcome, EspeakChannel, HttpAvatarClient, LocalSpeechChannel,
    RemoteChannel, SpeechConfig, SpeechDispatcher, StatusSink, StatusTarget, StatusUpdate,
    TracingStatusSink, sanitize,
};

/// Speech dispatcher - remote avatar speech with local voice fallback
#[derive(Parser, Debug)]
#[command(name = "speech-dispatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Speak text through the avatar, falling back to the local voice
    Speak {
        /// Text to speak
        #[arg(required = true)]
        text: Vec<String>,

        /// Skip the remote avatar and use the local voice only
        #[arg(long)]
        local_only: bool,

        /// Maximum seconds to wait for speech to finish
        #[arg(long, default_value_t = 30)]
        wait_seconds: u64,
    },

    /// Print text as it would be sent to a speech engine
    Sanitize {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List local voices and show which one would be selected
    Voices,
}

/// Logs every status and wakes the CLI when a local utterance finishes
struct CliStatusSink {
    inner: TracingStatusSink,
    finished: Arc<Notify>,
}

impl StatusSink for CliStatusSink {
    fn notify(&self, update: &StatusUpdate) {
        self.inner.notify(update);
        if update.target == StatusTarget::Voice
            && matches!(update.status, ChannelStatus::Ready | ChannelStatus::Error)
        {
            self.finished.notify_one();
        }
    }

    fn speaking_intent(&self, speaking: bool) {
        self.inner.speaking_intent(speaking);
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<SpeechConfig> {
    match path {
        Some(config_path) => {
            info!("Loading configuration from {}", config_path.display());
            SpeechConfig::from_file(&config_path).map_err(|e| anyhow!(e.to_string()))
        }
        None => SpeechConfig::from_env().map_err(|e| anyhow!(e.to_string())),
    }
}

async fn speak(
    config: SpeechConfig,
    text: String,
    local_only: bool,
    wait_seconds: u64,
) -> anyhow::Result<()> {
    let remote = match config.http_avatar_config() {
        Some(http_config) if !local_only => {
            let client =
                HttpAvatarClient::new(http_config).map_err(|e| anyhow!(e.to_string()))?;
            Some(Arc::new(client) as Arc<dyn RemoteChannel>)
        }
        _ => None,
    };
    let local = Arc::new(EspeakChannel::new(config.espeak_config()));
    let finished = Arc::new(Notify::new());
    let sink = Arc::new(CliStatusSink {
        inner: TracingStatusSink,
        finished: finished.clone(),
    });

    let dispatcher = SpeechDispatcher::new(remote, local, sink, config.dispatcher_config());
    let wait = Duration::from_secs(wait_seconds);

    if config.has_avatar() && !local_only && !dispatcher.init_remote_channel().await {
        warn!("Avatar unavailable, continuing with the local voice");
    }

    match dispatcher.dispatch(&text).await {
        DispatchOutcome::Remote => {
            info!("Text sent to avatar, keeping the session open for {wait_seconds}s");
            tokio::time::sleep(wait).await;
        }
        DispatchOutcome::Local => {
            if tokio::time::timeout(wait, finished.notified()).await.is_err() {
                warn!("Local voice still speaking after {wait_seconds}s, giving up");
            }
        }
        DispatchOutcome::Empty => println!("Nothing to speak"),
        DispatchOutcome::LocalUnavailable => {
            return Err(anyhow!("No speech channel available"));
        }
        DispatchOutcome::LocalFailed => {
            return Err(anyhow!("Local voice failed to start"));
        }
    }

    dispatcher.stop_remote_channel().await;
    Ok(())
}

fn list_voices(config: &SpeechConfig) {
    let channel = EspeakChannel::new(config.espeak_config());
    if !channel.is_available() {
        println!("No local speech engine found (install espeak-ng or set ESPEAK_BIN)");
        return;
    }

    let voices = channel.voices();
    let selected = config.voice_selector().select(&voices).map(|v| v.id.clone());
    for voice in &voices {
        let marker = if selected.as_deref() == Some(voice.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<12} {:<32} {}",
            voice.id,
            voice.name,
            voice.gender.as_deref().unwrap_or("-")
        );
    }
    if selected.is_none() {
        println!("No voice matches the configured locale; the engine default is used");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sanitize { text } => {
            println!("{}", sanitize(text.join(" ").as_str()));
        }
        Commands::Voices => {
            let config = load_config(cli.config)?;
            list_voices(&config);
        }
        Commands::Speak {
            text,
            local_only,
            wait_seconds,
        } => {
            let config = load_config(cli.config)?;
            speak(config, text.join(" "), local_only, wait_seconds).await?;
        }
    }

    Ok(())
}
