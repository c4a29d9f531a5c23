//! # text2speech
//!
//! A Rust library and CLI for turning text files into speech audio through a
//! cloud text-to-speech service.
//!
//! ## Features
//!
//! - **Segmentation**: split long documents into request-sized chunks at
//!   sentence boundaries, keeping `[HH:MM:SS]` timestamp markers on their own
//! - **SSML**: optionally send timestamped scripts as SSML with `<mark>`s
//! - **Layered configuration**: CLI flags, environment variables and saved
//!   profiles resolve into one explicit [`config::Settings`]
//! - **Google Cloud TTS**: REST engine with service-account, API-key or
//!   bearer-token auth (feature `google`, on by default)
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! text2speech = { version = "0.1", features = ["google"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use text2speech::{engines::google::GoogleTtsEngine, SynthesisEngine, SynthesisInput};
//!
//! let mut engine = GoogleTtsEngine::new();
//! engine.connect()?;
//!
//! let clip = engine.synthesize(&SynthesisInput::Text("Hello, world!".into()), None)?;
//! clip.write_to(&PathBuf::from("hello.mp3"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod engines;
pub mod inputs;
pub mod pipeline;
pub mod text;

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Audio container produced for each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 3] = [AudioFormat::Mp3, AudioFormat::Wav, AudioFormat::Ogg];

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mp3 => "MP3",
            Self::Wav => "WAV",
            Self::Ogg => "OGG",
        })
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MP3" => Ok(Self::Mp3),
            "WAV" | "LINEAR16" => Ok(Self::Wav),
            "OGG" | "OGG_OPUS" => Ok(Self::Ogg),
            other => Err(format!(
                "unsupported audio format '{other}' (expected MP3, WAV or OGG)"
            )),
        }
    }
}

/// Gender hint for voice selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoiceGender {
    Male,
    Female,
    Neutral,
}

impl fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Neutral => "NEUTRAL",
        })
    }
}

impl FromStr for VoiceGender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "NEUTRAL" => Ok(Self::Neutral),
            other => Err(format!(
                "unknown voice gender '{other}' (expected MALE, FEMALE or NEUTRAL)"
            )),
        }
    }
}

/// What gets sent to the engine for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisInput {
    Text(String),
    Ssml(String),
}

impl SynthesisInput {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) | Self::Ssml(s) => s,
        }
    }

    pub fn is_ssml(&self) -> bool {
        matches!(self, Self::Ssml(_))
    }
}

/// A voice offered by an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    pub language_codes: Vec<String>,
    pub gender: Option<VoiceGender>,
    pub natural_sample_rate_hertz: Option<u32>,
}

/// The result of a synthesis (text-to-speech) operation.
///
/// Holds the encoded audio exactly as the engine returned it.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio bytes (MP3, WAV or Ogg/Opus)
    pub bytes: Vec<u8>,
    /// Container of `bytes`
    pub format: AudioFormat,
}

impl AudioClip {
    /// Write the encoded audio to `path` unchanged.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }

    /// Duration of the audio in seconds.
    ///
    /// Only WAV clips can be measured without a decoder; other formats
    /// return `None`, as does a WAV clip whose header cannot be read.
    pub fn duration_secs(&self) -> Option<f64> {
        if self.format != AudioFormat::Wav {
            return None;
        }
        let reader = hound::WavReader::new(Cursor::new(self.bytes.as_slice())).ok()?;
        let sample_rate = reader.spec().sample_rate;
        if sample_rate == 0 {
            return None;
        }
        Some(reader.duration() as f64 / sample_rate as f64)
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// This trait defines the standard operations that all synthesis engines must support.
/// Each engine may have different parameter types for connecting and for synthesis.
pub trait SynthesisEngine {
    /// Parameters for configuring a synthesis request (voice, format, etc.)
    type SynthesisParams;
    /// Parameters for configuring the connection (credentials, endpoint, etc.)
    type ClientParams: Default;

    /// Connect to the service using default parameters.
    fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect_with_params(Self::ClientParams::default())
    }

    /// Connect to the service with custom parameters.
    fn connect_with_params(
        &mut self,
        params: Self::ClientParams,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Drop the connection and any cached credentials.
    fn disconnect(&mut self);

    /// List voices, optionally restricted to a BCP-47 language code.
    fn list_voices(
        &mut self,
        language_code: Option<&str>,
    ) -> Result<Vec<VoiceInfo>, Box<dyn std::error::Error>>;

    /// Synthesize speech for one input.
    fn synthesize(
        &mut self,
        input: &SynthesisInput,
        params: Option<Self::SynthesisParams>,
    ) -> Result<AudioClip, Box<dyn std::error::Error>>;

    /// Synthesize speech and write it to a file.
    ///
    /// Default implementation calls `synthesize()` then `AudioClip::write_to()`.
    fn synthesize_to_file(
        &mut self,
        input: &SynthesisInput,
        path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.synthesize(input, params)?.write_to(path)?;
        Ok(())
    }

    /// Whether an error returned by this engine is worth retrying
    /// (rate limiting, timeouts, server-side failures).
    fn is_transient(&self, _error: &(dyn std::error::Error + 'static)) -> bool {
        false
    }
}
