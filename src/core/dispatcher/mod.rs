//! # Speech Dispatcher
//!
//! Sends text to a remote avatar speech service and falls back to a local
//! synthesis engine whenever the remote channel is unavailable or rejects the
//! text. Every transition is reported to a [`StatusSink`](crate::core::status::StatusSink).
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use speech_dispatch::core::dispatcher::{DispatcherConfig, SpeechDispatcher};
//! use speech_dispatch::core::local::{EspeakChannel, EspeakConfig};
//! use speech_dispatch::core::remote::{HttpAvatarClient, HttpAvatarConfig, RemoteChannel};
//! use speech_dispatch::core::status::TracingStatusSink;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let remote: Arc<dyn RemoteChannel> =
//!         Arc::new(HttpAvatarClient::new(HttpAvatarConfig::default())?);
//!     let dispatcher = SpeechDispatcher::new(
//!         Some(remote),
//!         Arc::new(EspeakChannel::new(EspeakConfig::default())),
//!         Arc::new(TracingStatusSink),
//!         DispatcherConfig::default(),
//!     );
//!
//!     dispatcher.init_remote_channel().await;
//!     dispatcher.dispatch("✅ ¡Hola! Bienvenido ☕").await;
//!     dispatcher.stop_remote_channel().await;
//!     Ok(())
//! }
//! ```

mod errors;
mod manager;
mod state;


pub use errors::{SpeechError, SpeechResult};
pub use manager::{DispatchOutcome, DispatcherConfig, SpeechDispatcher, StopOutcome};
pub use state::DispatcherState;
