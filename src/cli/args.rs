use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use text2speech::config::SettingsLayer;
use text2speech::{AudioFormat, VoiceGender};

/// text2speech - Convert text files to speech with Google Cloud Text-to-Speech
#[derive(Parser, Debug)]
#[command(name = "text2speech")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Service-account JSON key (overrides GOOGLE_APPLICATION_CREDENTIALS)
    #[arg(long, global = true, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Load defaults from a saved profile
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Directory holding saved profiles
    #[arg(long, global = true, value_name = "DIR")]
    pub profile_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert text files to audio, one audio file per chunk
    Synth(SynthArgs),

    /// List available voices
    Voices {
        /// Only voices for this language (`en` or `en-US`)
        #[arg(short, long)]
        language: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show how a file would be split, without calling the API
    Segment {
        /// Text file to split
        file: PathBuf,

        /// Maximum characters per chunk
        #[arg(short, long)]
        max_chunk_length: Option<usize>,

        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Inspect saved profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// List profile names
    List,
    /// Print a profile as JSON
    Show { name: String },
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Text files, directories or wildcard patterns (`scripts/*.txt`)
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// BCP-47 language code, e.g. en-US
    #[arg(short, long)]
    pub language: Option<String>,

    /// Voice name, e.g. en-US-Neural2-F
    #[arg(long)]
    pub voice: Option<String>,

    /// Voice gender: MALE, FEMALE or NEUTRAL
    #[arg(long)]
    pub gender: Option<VoiceGender>,

    /// Output format: MP3, WAV or OGG
    #[arg(short, long)]
    pub format: Option<AudioFormat>,

    /// Speaking rate (0.25 - 4.0)
    #[arg(long)]
    pub rate: Option<f32>,

    /// Pitch in semitones (-20.0 - 20.0)
    #[arg(long, allow_hyphen_values = true)]
    pub pitch: Option<f32>,

    /// Maximum characters per request
    #[arg(long)]
    pub max_chunk_length: Option<usize>,

    /// Send SSML with <mark>s for timestamp markers
    #[arg(long, overrides_with = "no_ssml")]
    pub ssml: bool,

    /// Send plain text, overriding a profile or environment that enables SSML
    #[arg(long, overrides_with = "ssml")]
    pub no_ssml: bool,

    /// Leave timestamp markers out instead of reading them (plain-text mode)
    #[arg(long, overrides_with = "no_skip_markers")]
    pub skip_markers: bool,

    /// Read timestamp markers aloud even if a profile skips them
    #[arg(long, overrides_with = "skip_markers")]
    pub no_skip_markers: bool,

    /// Pause at blank lines in SSML mode, in milliseconds
    #[arg(long, value_name = "MS")]
    pub paragraph_pause: Option<u64>,

    /// Append the voice name to output file names
    #[arg(long, overrides_with = "no_voice_in_filename")]
    pub voice_in_filename: bool,

    /// Leave the voice name out of output file names
    #[arg(long, overrides_with = "voice_in_filename")]
    pub no_voice_in_filename: bool,

    /// Directory for generated audio
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Attempts per chunk before giving up
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Save the resolved settings under this profile name
    #[arg(long, value_name = "NAME")]
    pub save_profile: Option<String>,

    /// Prompt for missing credentials, language, voice and format
    #[arg(short, long)]
    pub interactive: bool,
}

// A `--x`/`--no-x` pair. Neither given stays `None` so lower layers can
// supply the value.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl SynthArgs {
    pub fn to_layer(&self, credentials: Option<PathBuf>) -> SettingsLayer {
        SettingsLayer {
            credentials_path: credentials,
            language_code: self.language.clone(),
            voice_name: self.voice.clone(),
            gender: self.gender,
            output_format: self.format,
            speaking_rate: self.rate,
            pitch: self.pitch,
            max_chunk_length: self.max_chunk_length,
            ssml: switch(self.ssml, self.no_ssml),
            skip_markers: switch(self.skip_markers, self.no_skip_markers),
            paragraph_pause_ms: self.paragraph_pause,
            voice_in_filename: switch(self.voice_in_filename, self.no_voice_in_filename),
            output_dir: self.output_dir.clone(),
            max_attempts: self.max_attempts,
            ..Default::default()
        }
    }
}
