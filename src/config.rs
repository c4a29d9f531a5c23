//! Runtime configuration.
//!
//! Values come from up to three [`SettingsLayer`]s (CLI flags, environment,
//! saved profile) and are resolved once, at startup, into an explicit
//! [`Settings`] that is passed to the pipeline. Nothing is read from the
//! environment after that point.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_builder::{Builder, UninitializedFieldError};
use serde::{Deserialize, Serialize};

use crate::text::{InputOptions, DEFAULT_MAX_CHUNK_LENGTH};
use crate::{AudioFormat, VoiceGender};

pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_ACCESS_TOKEN";
pub const ENV_LANGUAGE_CODE: &str = "LANGUAGE_CODE";
pub const ENV_VOICE_NAME: &str = "VOICE_NAME";
pub const ENV_SSML_GENDER: &str = "SSML_GENDER";
pub const ENV_OUTPUT_FORMAT: &str = "OUTPUT_FORMAT";
pub const ENV_MAX_CHUNK_LENGTH: &str = "MAX_CHUNK_LENGTH";

pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const SPEAKING_RATE_RANGE: (f32, f32) = (0.25, 4.0);
const PITCH_RANGE: (f32, f32) = (-20.0, 20.0);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting '{0}'")]
    Missing(String),
    #[error("Invalid value for '{key}': {message}")]
    Invalid { key: String, message: String },
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),
    #[error("Invalid profile name '{0}' (use letters, digits, '-' or '_')")]
    InvalidProfileName(String),
    #[error("No configuration directory available on this system; pass a profile directory explicitly")]
    NoConfigDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<UninitializedFieldError> for ConfigError {
    fn from(err: UninitializedFieldError) -> Self {
        let field = err.field_name();
        if field == "credentials" {
            return Self::Missing(format!(
                "credentials (set {ENV_CREDENTIALS}, {ENV_API_KEY} or {ENV_ACCESS_TOKEN}, \
                 or pass --credentials)"
            ));
        }
        Self::Missing(field.to_string())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.into(),
    }
}

/// How the engine authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Path to a service-account JSON key.
    ServiceAccount(PathBuf),
    /// API key sent as the `key` query parameter.
    ApiKey(String),
    /// Pre-issued OAuth2 bearer token.
    AccessToken(String),
}

// Secrets stay out of logs and panics.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceAccount(path) => f.debug_tuple("ServiceAccount").field(path).finish(),
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

/// One source of configuration values. Unset fields defer to lower layers.
///
/// This is also the on-disk profile format. API keys and access tokens are
/// never written to profiles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(skip)]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<VoiceGender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<AudioFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaking_rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_chunk_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssml: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_markers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_pause_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_in_filename: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl SettingsLayer {
    /// Read the layer from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the layer through an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gender = get(ENV_SSML_GENDER)
            .map(|v| v.parse::<VoiceGender>().map_err(|e| invalid(ENV_SSML_GENDER, e)))
            .transpose()?;
        let output_format = get(ENV_OUTPUT_FORMAT)
            .map(|v| v.parse::<AudioFormat>().map_err(|e| invalid(ENV_OUTPUT_FORMAT, e)))
            .transpose()?;
        let max_chunk_length = get(ENV_MAX_CHUNK_LENGTH)
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|e| invalid(ENV_MAX_CHUNK_LENGTH, e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            credentials_path: get(ENV_CREDENTIALS).map(PathBuf::from),
            api_key: get(ENV_API_KEY),
            access_token: get(ENV_ACCESS_TOKEN),
            language_code: get(ENV_LANGUAGE_CODE),
            voice_name: get(ENV_VOICE_NAME),
            gender,
            output_format,
            max_chunk_length,
            ..Default::default()
        })
    }

    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            credentials_path: self.credentials_path.or(fallback.credentials_path),
            api_key: self.api_key.or(fallback.api_key),
            access_token: self.access_token.or(fallback.access_token),
            language_code: self.language_code.or(fallback.language_code),
            voice_name: self.voice_name.or(fallback.voice_name),
            gender: self.gender.or(fallback.gender),
            output_format: self.output_format.or(fallback.output_format),
            speaking_rate: self.speaking_rate.or(fallback.speaking_rate),
            pitch: self.pitch.or(fallback.pitch),
            max_chunk_length: self.max_chunk_length.or(fallback.max_chunk_length),
            ssml: self.ssml.or(fallback.ssml),
            skip_markers: self.skip_markers.or(fallback.skip_markers),
            paragraph_pause_ms: self.paragraph_pause_ms.or(fallback.paragraph_pause_ms),
            voice_in_filename: self.voice_in_filename.or(fallback.voice_in_filename),
            output_dir: self.output_dir.or(fallback.output_dir),
            max_attempts: self.max_attempts.or(fallback.max_attempts),
        }
    }

    /// Credentials named by this layer alone, API key first.
    pub fn credentials(&self) -> Option<Credentials> {
        if let Some(key) = &self.api_key {
            return Some(Credentials::ApiKey(key.clone()));
        }
        if let Some(token) = &self.access_token {
            return Some(Credentials::AccessToken(token.clone()));
        }
        self.credentials_path
            .as_ref()
            .map(|p| Credentials::ServiceAccount(p.clone()))
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "ConfigError"))]
pub struct Settings {
    pub credentials: Credentials,
    #[builder(setter(into), default = "DEFAULT_LANGUAGE_CODE.to_string()")]
    pub language_code: String,
    #[builder(setter(into, strip_option), default)]
    pub voice_name: Option<String>,
    #[builder(setter(strip_option), default)]
    pub gender: Option<VoiceGender>,
    #[builder(default = "AudioFormat::Mp3")]
    pub output_format: AudioFormat,
    #[builder(default = "1.0")]
    pub speaking_rate: f32,
    #[builder(default = "0.0")]
    pub pitch: f32,
    #[builder(default = "DEFAULT_MAX_CHUNK_LENGTH")]
    pub max_chunk_length: usize,
    #[builder(default)]
    pub ssml: bool,
    #[builder(default)]
    pub skip_markers: bool,
    #[builder(setter(strip_option), default)]
    pub paragraph_pause: Option<Duration>,
    #[builder(default)]
    pub voice_in_filename: bool,
    #[builder(setter(into), default = "PathBuf::from(\".\")")]
    pub output_dir: PathBuf,
    #[builder(default = "DEFAULT_MAX_ATTEMPTS")]
    pub max_attempts: u32,
}

impl SettingsBuilder {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(rate) = self.speaking_rate {
            let (lo, hi) = SPEAKING_RATE_RANGE;
            if !(lo..=hi).contains(&rate) {
                return Err(invalid("speaking_rate", format!("{rate} is outside {lo}..={hi}")));
            }
        }
        if let Some(pitch) = self.pitch {
            let (lo, hi) = PITCH_RANGE;
            if !(lo..=hi).contains(&pitch) {
                return Err(invalid("pitch", format!("{pitch} is outside {lo}..={hi}")));
            }
        }
        if self.max_chunk_length == Some(0) {
            return Err(invalid("max_chunk_length", "must be greater than zero"));
        }
        if self.max_attempts == Some(0) {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if let Some(language) = &self.language_code {
            if language.trim().is_empty() {
                return Err(invalid("language_code", "must not be empty"));
            }
        }
        Ok(())
    }
}

impl Settings {
    /// Resolve settings from layers ordered highest priority first.
    ///
    /// Credentials are taken whole from the first layer that names any, so a
    /// path given on the command line beats an API key in the environment.
    /// The language comes from the highest layer that sets either a language
    /// or a voice; a voice implies its own language (`en-GB-Neural2-A` →
    /// `en-GB`). Without either the language defaults to `en-US`.
    pub fn resolve(layers: &[&SettingsLayer]) -> Result<Self, ConfigError> {
        let credentials = layers.iter().find_map(|layer| layer.credentials());
        let merged = layers
            .iter()
            .fold(SettingsLayer::default(), |acc, layer| acc.or((*layer).clone()));

        let mut builder = SettingsBuilder::default();
        if let Some(credentials) = credentials {
            builder.credentials(credentials);
        }

        // The highest layer that names a language or a voice decides it.
        let language = layers.iter().find_map(|layer| {
            layer.language_code.clone().or_else(|| {
                layer
                    .voice_name
                    .as_deref()
                    .and_then(language_from_voice_name)
                    .map(str::to_string)
            })
        });
        if let Some(language) = language {
            builder.language_code(language);
        }
        if let Some(voice) = merged.voice_name {
            builder.voice_name(voice);
        }
        if let Some(gender) = merged.gender {
            builder.gender(gender);
        }
        if let Some(format) = merged.output_format {
            builder.output_format(format);
        }
        if let Some(rate) = merged.speaking_rate {
            builder.speaking_rate(rate);
        }
        if let Some(pitch) = merged.pitch {
            builder.pitch(pitch);
        }
        if let Some(max) = merged.max_chunk_length {
            builder.max_chunk_length(max);
        }
        if let Some(ssml) = merged.ssml {
            builder.ssml(ssml);
        }
        if let Some(skip) = merged.skip_markers {
            builder.skip_markers(skip);
        }
        if let Some(ms) = merged.paragraph_pause_ms {
            builder.paragraph_pause(Duration::from_millis(ms));
        }
        if let Some(flag) = merged.voice_in_filename {
            builder.voice_in_filename(flag);
        }
        if let Some(dir) = merged.output_dir {
            builder.output_dir(dir);
        }
        if let Some(attempts) = merged.max_attempts {
            builder.max_attempts(attempts);
        }

        let settings = builder.build()?;
        if let Credentials::ServiceAccount(path) = &settings.credentials {
            if !path.is_file() {
                return Err(invalid(
                    "credentials",
                    format!("service account key not found at {}", path.display()),
                ));
            }
        }
        Ok(settings)
    }

    /// Options controlling how chunks become synthesis inputs.
    pub fn input_options(&self) -> InputOptions {
        InputOptions {
            ssml: self.ssml,
            skip_markers: self.skip_markers,
            paragraph_pause: self.paragraph_pause,
            ..InputOptions::default()
        }
    }

    /// These settings as a profile layer. Secrets are left out.
    pub fn to_layer(&self) -> SettingsLayer {
        let credentials_path = match &self.credentials {
            Credentials::ServiceAccount(path) => Some(path.clone()),
            _ => None,
        };
        SettingsLayer {
            credentials_path,
            api_key: None,
            access_token: None,
            language_code: Some(self.language_code.clone()),
            voice_name: self.voice_name.clone(),
            gender: self.gender,
            output_format: Some(self.output_format),
            speaking_rate: Some(self.speaking_rate),
            pitch: Some(self.pitch),
            max_chunk_length: Some(self.max_chunk_length),
            ssml: Some(self.ssml),
            skip_markers: Some(self.skip_markers),
            paragraph_pause_ms: self.paragraph_pause.map(|d| d.as_millis() as u64),
            voice_in_filename: Some(self.voice_in_filename),
            output_dir: Some(self.output_dir.clone()),
            max_attempts: Some(self.max_attempts),
        }
    }
}

/// The BCP-47 language code at the front of a voice name.
///
/// Voice names follow the pattern `{language}-{REGION}-{family}-{variant}`,
/// e.g. `en-US-Neural2-F` → `en-US`, `cmn-CN-Wavenet-A` → `cmn-CN`.
pub fn language_from_voice_name(voice: &str) -> Option<&str> {
    let mut parts = voice.splitn(3, '-');
    let language = parts.next()?;
    let region = parts.next()?;

    let language_ok = (2..=3).contains(&language.len())
        && language.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = region.len() == 2 && region.chars().all(|c| c.is_ascii_uppercase());
    if !(language_ok && region_ok) {
        return None;
    }
    Some(&voice[..language.len() + 1 + region.len()])
}

/// Named profiles stored as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/text2speech/profiles`.
    pub fn default_location() -> Result<Self, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(base.join("text2speech").join("profiles")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, ConfigError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::InvalidProfileName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    pub fn save(&self, name: &str, layer: &SettingsLayer) -> Result<PathBuf, ConfigError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(layer)?;
        fs::write(&path, json)?;
        log::info!("Saved profile '{}' to {}", name, path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<SettingsLayer, ConfigError> {
        let path = self.path_for(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::ProfileNotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let layer = serde_json::from_str(&content)?;
        log::debug!("Loaded profile '{}' from {}", name, path.display());
        Ok(layer)
    }

    /// Profile names in sorted order. A missing directory holds no profiles.
    pub fn list(&self) -> Result<Vec<String>, ConfigError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_layer(vars: &[(&str, &str)]) -> Result<SettingsLayer, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SettingsLayer::from_lookup(|key| map.get(key).cloned())
    }

    fn with_token() -> SettingsLayer {
        SettingsLayer {
            access_token: Some("token".into()),
            ..Default::default()
        }
    }

    #[test]
    fn reads_the_environment_layer() {
        let layer = env_layer(&[
            (ENV_API_KEY, "abc"),
            (ENV_LANGUAGE_CODE, "de-DE"),
            (ENV_SSML_GENDER, "female"),
            (ENV_OUTPUT_FORMAT, "wav"),
            (ENV_MAX_CHUNK_LENGTH, "1200"),
            (ENV_VOICE_NAME, "  "),
        ])
        .unwrap();

        assert_eq!(layer.api_key.as_deref(), Some("abc"));
        assert_eq!(layer.language_code.as_deref(), Some("de-DE"));
        assert_eq!(layer.gender, Some(VoiceGender::Female));
        assert_eq!(layer.output_format, Some(AudioFormat::Wav));
        assert_eq!(layer.max_chunk_length, Some(1200));
        assert_eq!(layer.voice_name, None);
    }

    #[test]
    fn rejects_invalid_environment_values() {
        let err = env_layer(&[(ENV_OUTPUT_FORMAT, "flac")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == ENV_OUTPUT_FORMAT));

        let err = env_layer(&[(ENV_MAX_CHUNK_LENGTH, "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn missing_credentials_is_a_configuration_error() {
        let err = Settings::resolve(&[&SettingsLayer::default()]).unwrap_err();
        match err {
            ConfigError::Missing(what) => assert!(what.contains("credentials"), "{what}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn applies_defaults() {
        let settings = Settings::resolve(&[&with_token()]).unwrap();
        assert_eq!(settings.language_code, DEFAULT_LANGUAGE_CODE);
        assert_eq!(settings.output_format, AudioFormat::Mp3);
        assert_eq!(settings.max_chunk_length, DEFAULT_MAX_CHUNK_LENGTH);
        assert_eq!(settings.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert!(!settings.ssml);
        assert!(!settings.skip_markers);
        assert_eq!(settings.voice_name, None);
    }

    #[test]
    fn higher_layers_win() {
        let cli = SettingsLayer {
            output_format: Some(AudioFormat::Ogg),
            ..Default::default()
        };
        let env = SettingsLayer {
            output_format: Some(AudioFormat::Wav),
            language_code: Some("fr-FR".into()),
            access_token: Some("t".into()),
            ..Default::default()
        };
        let profile = SettingsLayer {
            language_code: Some("es-ES".into()),
            ssml: Some(true),
            ..Default::default()
        };

        let settings = Settings::resolve(&[&cli, &env, &profile]).unwrap();
        assert_eq!(settings.output_format, AudioFormat::Ogg);
        assert_eq!(settings.language_code, "fr-FR");
        assert!(settings.ssml);
    }

    #[test]
    fn credentials_come_from_the_highest_layer_naming_any() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("key.json");
        fs::write(&key, "{}").unwrap();

        let cli = SettingsLayer {
            credentials_path: Some(key.clone()),
            ..Default::default()
        };
        let env = SettingsLayer {
            api_key: Some("from-env".into()),
            ..Default::default()
        };

        let settings = Settings::resolve(&[&cli, &env]).unwrap();
        assert_eq!(settings.credentials, Credentials::ServiceAccount(key));

        let settings = Settings::resolve(&[&SettingsLayer::default(), &env]).unwrap();
        assert_eq!(settings.credentials, Credentials::ApiKey("from-env".into()));
    }

    #[test]
    fn missing_service_account_file_is_rejected() {
        let layer = SettingsLayer {
            credentials_path: Some(PathBuf::from("/definitely/not/here.json")),
            ..Default::default()
        };
        let err = Settings::resolve(&[&layer]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "credentials"));
    }

    #[test]
    fn language_is_derived_from_the_voice_name() {
        let layer = SettingsLayer {
            voice_name: Some("en-GB-Neural2-A".into()),
            ..with_token()
        };
        let settings = Settings::resolve(&[&layer]).unwrap();
        assert_eq!(settings.language_code, "en-GB");

        let explicit = SettingsLayer {
            language_code: Some("en-AU".into()),
            ..layer
        };
        let settings = Settings::resolve(&[&explicit]).unwrap();
        assert_eq!(settings.language_code, "en-AU");
    }

    #[test]
    fn a_voice_on_a_higher_layer_beats_a_lower_language() {
        let cli = SettingsLayer {
            voice_name: Some("de-DE-Neural2-B".into()),
            ..Default::default()
        };
        let env = SettingsLayer {
            language_code: Some("en-US".into()),
            ..with_token()
        };
        let settings = Settings::resolve(&[&cli, &env]).unwrap();
        assert_eq!(settings.voice_name.as_deref(), Some("de-DE-Neural2-B"));
        assert_eq!(settings.language_code, "de-DE");

        let cli = SettingsLayer {
            language_code: Some("de-AT".into()),
            ..cli
        };
        let settings = Settings::resolve(&[&cli, &env]).unwrap();
        assert_eq!(settings.language_code, "de-AT");
    }

    #[test]
    fn validates_ranges() {
        for layer in [
            SettingsLayer {
                speaking_rate: Some(5.0),
                ..with_token()
            },
            SettingsLayer {
                pitch: Some(-21.0),
                ..with_token()
            },
            SettingsLayer {
                max_chunk_length: Some(0),
                ..with_token()
            },
            SettingsLayer {
                max_attempts: Some(0),
                ..with_token()
            },
        ] {
            assert!(matches!(
                Settings::resolve(&[&layer]),
                Err(ConfigError::Invalid { .. })
            ));
        }
    }

    #[test]
    fn parses_language_from_voice_names() {
        assert_eq!(language_from_voice_name("en-US-Neural2-F"), Some("en-US"));
        assert_eq!(language_from_voice_name("cmn-CN-Wavenet-A"), Some("cmn-CN"));
        assert_eq!(language_from_voice_name("de-DE"), Some("de-DE"));
        assert_eq!(language_from_voice_name("Kore"), None);
        assert_eq!(language_from_voice_name("EN-us-Standard-A"), None);
    }

    #[test]
    fn profiles_round_trip_without_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path().join("profiles"));
        assert!(store.list().unwrap().is_empty());

        let layer = SettingsLayer {
            api_key: Some("secret".into()),
            voice_name: Some("en-US-Neural2-F".into()),
            output_format: Some(AudioFormat::Ogg),
            paragraph_pause_ms: Some(300),
            ..Default::default()
        };
        let path = store.save("narrator", &layer).unwrap();
        let json = fs::read_to_string(path).unwrap();
        assert!(!json.contains("secret"));

        let loaded = store.load("narrator").unwrap();
        assert_eq!(loaded.api_key, None);
        assert_eq!(loaded.voice_name.as_deref(), Some("en-US-Neural2-F"));
        assert_eq!(loaded.output_format, Some(AudioFormat::Ogg));
        assert_eq!(loaded.paragraph_pause_ms, Some(300));
        assert_eq!(store.list().unwrap(), vec!["narrator".to_string()]);
    }

    #[test]
    fn unknown_and_invalid_profiles_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        assert!(matches!(store.load("nope"), Err(ConfigError::ProfileNotFound(_))));
        assert!(matches!(
            store.load("../etc/passwd"),
            Err(ConfigError::InvalidProfileName(_))
        ));
    }

    #[test]
    fn settings_convert_back_to_a_layer() {
        let settings = SettingsBuilder::default()
            .credentials(Credentials::ApiKey("k".into()))
            .voice_name("en-US-Neural2-F")
            .paragraph_pause(Duration::from_millis(250))
            .build()
            .unwrap();
        let layer = settings.to_layer();
        assert_eq!(layer.api_key, None);
        assert_eq!(layer.credentials_path, None);
        assert_eq!(layer.paragraph_pause_ms, Some(250));

        let input = settings.input_options();
        assert_eq!(input.paragraph_pause, Some(Duration::from_millis(250)));
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let shown = format!("{:?}", Credentials::ApiKey("super-secret".into()));
        assert!(!shown.contains("super-secret"));
    }
}
