use std::time::Duration;

use crate::config::{
    Credentials, Settings, SettingsLayer, ENV_ACCESS_TOKEN, ENV_API_KEY, ENV_CREDENTIALS,
};
use crate::{AudioClip, AudioFormat, SynthesisEngine, SynthesisInput, VoiceGender, VoiceInfo};

use super::api::{ApiClient, GoogleTtsError, RequestVoice, DEFAULT_BASE_URL, ENV_BASE_URL};
use super::auth::Auth;
use super::voices::filter_voices;

/// Parameters for connecting to the API.
#[derive(Debug, Clone)]
pub struct GoogleClientParams {
    /// `None` reads credentials from the environment.
    pub credentials: Option<Credentials>,
    /// `None` uses `TEXT2SPEECH_BASE_URL` or the public endpoint.
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GoogleClientParams {
    fn default() -> Self {
        Self {
            credentials: None,
            base_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl GoogleClientParams {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            credentials: Some(settings.credentials.clone()),
            ..Default::default()
        }
    }
}

/// Voice and audio parameters for a synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleVoiceParams {
    /// BCP-47 language code, e.g. `"en-US"`.
    pub language_code: String,
    /// Exact voice name (e.g. `"en-US-Neural2-F"`). `None` lets the service pick.
    pub voice_name: Option<String>,
    pub gender: Option<VoiceGender>,
    pub format: AudioFormat,
    /// Range: 0.25–4.0, default 1.0.
    pub speaking_rate: f32,
    /// Semitones. Range: -20.0–20.0, default 0.0.
    pub pitch: f32,
}

impl Default for GoogleVoiceParams {
    fn default() -> Self {
        Self {
            language_code: crate::config::DEFAULT_LANGUAGE_CODE.to_string(),
            voice_name: None,
            gender: None,
            format: AudioFormat::Mp3,
            speaking_rate: 1.0,
            pitch: 0.0,
        }
    }
}

impl From<&Settings> for GoogleVoiceParams {
    fn from(settings: &Settings) -> Self {
        Self {
            language_code: settings.language_code.clone(),
            voice_name: settings.voice_name.clone(),
            gender: settings.gender,
            format: settings.output_format,
            speaking_rate: settings.speaking_rate,
            pitch: settings.pitch,
        }
    }
}

/// Google Cloud Text-to-Speech engine.
///
/// # Quick Start
///
/// ```rust,no_run
/// use text2speech::{SynthesisEngine, SynthesisInput, engines::google::GoogleTtsEngine};
///
/// // Credentials from GOOGLE_APPLICATION_CREDENTIALS, GOOGLE_API_KEY or GOOGLE_ACCESS_TOKEN
/// let mut engine = GoogleTtsEngine::new();
/// engine.connect()?;
/// let clip = engine.synthesize(&SynthesisInput::Text("Hello, world!".into()), None)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct GoogleTtsEngine {
    client: Option<ApiClient>,
}

impl Default for GoogleTtsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTtsEngine {
    pub fn new() -> Self {
        Self { client: None }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn client(&mut self) -> Result<&mut ApiClient, GoogleTtsError> {
        self.client.as_mut().ok_or(GoogleTtsError::NotConnected)
    }
}

fn credentials_from_env() -> Result<Credentials, Box<dyn std::error::Error>> {
    SettingsLayer::from_env()?.credentials().ok_or_else(|| {
        format!("No credentials found; set {ENV_CREDENTIALS}, {ENV_API_KEY} or {ENV_ACCESS_TOKEN}")
            .into()
    })
}

impl SynthesisEngine for GoogleTtsEngine {
    type SynthesisParams = GoogleVoiceParams;
    type ClientParams = GoogleClientParams;

    fn connect_with_params(
        &mut self,
        params: Self::ClientParams,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let credentials = match params.credentials {
            Some(credentials) => credentials,
            None => credentials_from_env()?,
        };
        let base_url = params
            .base_url
            .or_else(|| std::env::var(ENV_BASE_URL).ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let auth = Auth::from_credentials(&credentials)?;
        self.client = Some(ApiClient::new(base_url.as_str(), auth, params.timeout)?);
        log::info!("Connected to {}", base_url);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.client = None;
    }

    fn list_voices(
        &mut self,
        language_code: Option<&str>,
    ) -> Result<Vec<VoiceInfo>, Box<dyn std::error::Error>> {
        // The API only filters on full codes; a bare language is filtered locally.
        let server_filter = language_code.filter(|l| l.contains('-'));
        let voices = self.client()?.list_voices(server_filter)?;
        let voices = voices.into_iter().map(VoiceInfo::from).collect();
        Ok(filter_voices(voices, language_code))
    }

    fn synthesize(
        &mut self,
        input: &SynthesisInput,
        params: Option<Self::SynthesisParams>,
    ) -> Result<AudioClip, Box<dyn std::error::Error>> {
        let p = params.unwrap_or_default();
        let voice = RequestVoice {
            language_code: &p.language_code,
            voice_name: p.voice_name.as_deref(),
            gender: p.gender,
            format: p.format,
            speaking_rate: p.speaking_rate,
            pitch: p.pitch,
        };
        Ok(self.client()?.synthesize(input, &voice)?)
    }

    fn is_transient(&self, error: &(dyn std::error::Error + 'static)) -> bool {
        error
            .downcast_ref::<GoogleTtsError>()
            .map_or(false, GoogleTtsError::is_transient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsBuilder;
    use crate::engines::google::api::test_server;
    use base64::Engine as _;

    fn connected(url: String) -> GoogleTtsEngine {
        let mut engine = GoogleTtsEngine::new();
        engine
            .connect_with_params(GoogleClientParams {
                credentials: Some(Credentials::ApiKey("k".into())),
                base_url: Some(url),
                timeout: Duration::from_secs(5),
            })
            .unwrap();
        engine
    }

    #[test]
    fn synthesize_requires_a_connection() {
        let mut engine = GoogleTtsEngine::new();
        let err = engine
            .synthesize(&SynthesisInput::Text("hi".into()), None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GoogleTtsError>(),
            Some(GoogleTtsError::NotConnected)
        ));
        assert!(!engine.is_transient(err.as_ref()));
    }

    #[test]
    fn voice_params_follow_settings() {
        let settings = SettingsBuilder::default()
            .credentials(Credentials::ApiKey("k".into()))
            .language_code("en-GB")
            .voice_name("en-GB-Neural2-A")
            .output_format(AudioFormat::Wav)
            .speaking_rate(0.9)
            .build()
            .unwrap();
        let params = GoogleVoiceParams::from(&settings);
        assert_eq!(params.language_code, "en-GB");
        assert_eq!(params.voice_name.as_deref(), Some("en-GB-Neural2-A"));
        assert_eq!(params.format, AudioFormat::Wav);
        assert_eq!(params.speaking_rate, 0.9);
        assert_eq!(params.pitch, 0.0);
    }

    #[test]
    fn synthesizes_with_requested_format() {
        let audio = base64::engine::general_purpose::STANDARD.encode(b"RIFFdata");
        let (url, server) =
            test_server::serve(vec![(200, format!("{{\"audioContent\":\"{audio}\"}}"))]);

        let mut engine = connected(url);
        let params = GoogleVoiceParams {
            format: AudioFormat::Wav,
            ..Default::default()
        };
        let clip = engine
            .synthesize(&SynthesisInput::Ssml("<speak>Hi</speak>".into()), Some(params))
            .unwrap();
        assert_eq!(clip.format, AudioFormat::Wav);
        assert_eq!(clip.bytes, b"RIFFdata");

        let requests = server.join().unwrap();
        assert!(requests[0].contains("\"audioEncoding\":\"LINEAR16\""));
        assert!(requests[0].contains("\"ssml\":\"<speak>Hi</speak>\""));
    }

    #[test]
    fn lists_voices_for_a_bare_language() {
        let body = r#"{"voices":[
            {"name":"fr-FR-Neural2-A","languageCodes":["fr-FR"],"ssmlGender":"FEMALE"},
            {"name":"en-US-Neural2-F","languageCodes":["en-US"],"ssmlGender":"FEMALE"},
            {"name":"en-GB-Neural2-B","languageCodes":["en-GB"],"ssmlGender":"MALE"}
        ]}"#;
        let (url, server) = test_server::serve(vec![(200, body.to_string())]);

        let mut engine = connected(url);
        let voices = engine.list_voices(Some("en")).unwrap();
        let names: Vec<_> = voices.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["en-GB-Neural2-B", "en-US-Neural2-F"]);

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET /v1/voices?key=k "));
    }

    #[test]
    fn server_errors_are_transient() {
        let (url, server) = test_server::serve(vec![(503, "unavailable".to_string())]);
        let mut engine = connected(url);
        let err = engine
            .synthesize(&SynthesisInput::Text("hi".into()), None)
            .unwrap_err();
        assert!(engine.is_transient(err.as_ref()));
        server.join().unwrap();

        engine.disconnect();
        assert!(!engine.is_connected());
    }
}
