//! Google Cloud Text-to-Speech engine.
//!
//! Talks to the `v1` REST API with a blocking HTTP client. Each request
//! carries one chunk of plain text or SSML and returns encoded audio
//! (MP3, LINEAR16 WAV or Ogg/Opus).
//!
//! # Authentication
//!
//! | Credentials | Source | Sent as |
//! |---|---|---|
//! | Service-account key file | `GOOGLE_APPLICATION_CREDENTIALS` | Bearer token from a signed JWT, cached until expiry |
//! | API key | `GOOGLE_API_KEY` | `?key=` query parameter |
//! | Access token | `GOOGLE_ACCESS_TOKEN` | Bearer token as given |
//!
//! Set `TEXT2SPEECH_BASE_URL` to point the engine at another endpoint.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use text2speech::{AudioFormat, SynthesisEngine, SynthesisInput};
//! use text2speech::engines::google::{GoogleTtsEngine, GoogleVoiceParams};
//!
//! let mut engine = GoogleTtsEngine::new();
//! engine.connect()?;
//!
//! let params = GoogleVoiceParams {
//!     language_code: "en-GB".to_string(),
//!     voice_name: Some("en-GB-Neural2-A".to_string()),
//!     format: AudioFormat::Ogg,
//!     ..Default::default()
//! };
//!
//! engine.synthesize_to_file(
//!     &SynthesisInput::Text("Hello from London!".into()),
//!     &PathBuf::from("out.ogg"),
//!     Some(params),
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod auth;
pub mod engine;
pub mod voices;

pub use api::GoogleTtsError;
pub use engine::{GoogleClientParams, GoogleTtsEngine, GoogleVoiceParams};
pub use voices::filter_voices;
