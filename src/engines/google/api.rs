use std::time::Duration;

use base64::Engine as _;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use super::auth::Auth;
use super::voices::ApiVoice;
use crate::{AudioClip, AudioFormat, SynthesisInput, VoiceGender};

/// Public REST endpoint of the Text-to-Speech API.
pub const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const ENV_BASE_URL: &str = "TEXT2SPEECH_BASE_URL";

#[derive(thiserror::Error, Debug)]
pub enum GoogleTtsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid service account key: {0}")]
    ServiceAccount(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode audio content: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Failed to sign token request: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Engine not connected. Call connect() first.")]
    NotConnected,
}

impl GoogleTtsError {
    /// Rate limiting, timeouts, dropped connections and 5xx responses are
    /// worth retrying; everything else will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map_or(false, |s| is_transient_status(s.as_u16()))
            }
            Self::Api { status, .. } => is_transient_status(*status),
            _ => false,
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// Voice and audio settings for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestVoice<'a> {
    pub language_code: &'a str,
    pub voice_name: Option<&'a str>,
    pub gender: Option<VoiceGender>,
    pub format: AudioFormat,
    pub speaking_rate: f32,
    pub pitch: f32,
}

#[derive(Serialize)]
#[serde(untagged)]
enum InputBody<'a> {
    Text { text: &'a str },
    Ssml { ssml: &'a str },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelectionBody<'a> {
    language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssml_gender: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfigBody {
    audio_encoding: &'static str,
    speaking_rate: f32,
    pitch: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: InputBody<'a>,
    voice: VoiceSelectionBody<'a>,
    audio_config: AudioConfigBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Deserialize)]
struct ListVoicesResponse {
    #[serde(default)]
    voices: Vec<ApiVoice>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Name of the API's `audioEncoding` value for a container.
pub fn audio_encoding(format: AudioFormat) -> &'static str {
    match format {
        AudioFormat::Mp3 => "MP3",
        AudioFormat::Wav => "LINEAR16",
        AudioFormat::Ogg => "OGG_OPUS",
    }
}

fn build_request_body<'a>(
    input: &'a SynthesisInput,
    voice: &RequestVoice<'a>,
) -> SynthesizeRequest<'a> {
    SynthesizeRequest {
        input: match input {
            SynthesisInput::Text(text) => InputBody::Text { text },
            SynthesisInput::Ssml(ssml) => InputBody::Ssml { ssml },
        },
        voice: VoiceSelectionBody {
            language_code: voice.language_code,
            name: voice.voice_name,
            ssml_gender: voice.gender.map(|g| g.to_string()),
        },
        audio_config: AudioConfigBody {
            audio_encoding: audio_encoding(voice.format),
            speaking_rate: voice.speaking_rate,
            pitch: voice.pitch,
        },
    }
}

/// Blocking client for the `v1` REST API.
pub struct ApiClient {
    http: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        auth: Auth,
        timeout: Duration,
    ) -> Result<Self, GoogleTtsError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn synthesize(
        &mut self,
        input: &SynthesisInput,
        voice: &RequestVoice<'_>,
    ) -> Result<AudioClip, GoogleTtsError> {
        let body = build_request_body(input, voice);
        let request = self
            .http
            .post(format!("{}/v1/text:synthesize", self.base_url))
            .json(&body);

        let response: SynthesizeResponse = self.send(request)?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(response.audio_content)?;
        log::debug!(
            "Received {} bytes of {} audio for {} input chars",
            bytes.len(),
            voice.format,
            input.as_str().chars().count()
        );

        Ok(AudioClip {
            bytes,
            format: voice.format,
        })
    }

    pub fn list_voices(
        &mut self,
        language_code: Option<&str>,
    ) -> Result<Vec<ApiVoice>, GoogleTtsError> {
        let mut request = self.http.get(format!("{}/v1/voices", self.base_url));
        if let Some(language) = language_code {
            request = request.query(&[("languageCode", language)]);
        }
        let response: ListVoicesResponse = self.send(request)?;
        Ok(response.voices)
    }

    fn send<T: serde::de::DeserializeOwned>(
        &mut self,
        request: RequestBuilder,
    ) -> Result<T, GoogleTtsError> {
        let request = self.auth.apply(request, &self.http)?;
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(GoogleTtsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json()?)
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serves the given `(status, body)` responses, one per connection, and
    /// returns the raw requests it saw.
    pub fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);

                let mut head = String::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap();
                    }
                    let done = line == "\r\n" || line.is_empty();
                    head.push_str(&line);
                    if done {
                        break;
                    }
                }
                let mut request_body = vec![0u8; content_length];
                reader.read_exact(&mut request_body).unwrap();
                requests.push(format!("{head}{}", String::from_utf8_lossy(&request_body)));

                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let mut stream = reader.into_inner();
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            requests
        });

        (url, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> RequestVoice<'static> {
        RequestVoice {
            language_code: "en-US",
            voice_name: Some("en-US-Neural2-F"),
            gender: Some(VoiceGender::Female),
            format: AudioFormat::Ogg,
            speaking_rate: 1.25,
            pitch: -2.0,
        }
    }

    #[test]
    fn serializes_text_requests_in_camel_case() {
        let input = SynthesisInput::Text("Hello".into());
        let json = serde_json::to_value(build_request_body(&input, &voice())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "input": { "text": "Hello" },
                "voice": {
                    "languageCode": "en-US",
                    "name": "en-US-Neural2-F",
                    "ssmlGender": "FEMALE"
                },
                "audioConfig": {
                    "audioEncoding": "OGG_OPUS",
                    "speakingRate": 1.25,
                    "pitch": -2.0
                }
            })
        );
    }

    #[test]
    fn serializes_ssml_and_omits_unset_voice_fields() {
        let input = SynthesisInput::Ssml("<speak>Hi</speak>".into());
        let voice = RequestVoice {
            voice_name: None,
            gender: None,
            ..voice()
        };
        let json = serde_json::to_value(build_request_body(&input, &voice)).unwrap();
        assert_eq!(json["input"], serde_json::json!({ "ssml": "<speak>Hi</speak>" }));
        assert_eq!(json["voice"], serde_json::json!({ "languageCode": "en-US" }));
    }

    #[test]
    fn maps_formats_to_encodings() {
        assert_eq!(audio_encoding(AudioFormat::Mp3), "MP3");
        assert_eq!(audio_encoding(AudioFormat::Wav), "LINEAR16");
        assert_eq!(audio_encoding(AudioFormat::Ogg), "OGG_OPUS");
    }

    #[test]
    fn classifies_transient_statuses() {
        let api = |status| GoogleTtsError::Api {
            status,
            message: String::new(),
        };
        assert!(api(429).is_transient());
        assert!(api(503).is_transient());
        assert!(api(408).is_transient());
        assert!(!api(400).is_transient());
        assert!(!api(403).is_transient());
        assert!(!GoogleTtsError::NotConnected.is_transient());
    }

    #[test]
    fn synthesizes_against_a_local_server() {
        let audio = base64::engine::general_purpose::STANDARD.encode(b"ID3fake-mp3");
        let (url, server) = test_server::serve(vec![(
            200,
            format!("{{\"audioContent\":\"{audio}\"}}"),
        )]);

        let mut client =
            ApiClient::new(url, Auth::ApiKey("k123".into()), Duration::from_secs(5)).unwrap();
        let clip = client
            .synthesize(&SynthesisInput::Text("Hi there".into()), &voice())
            .unwrap();
        assert_eq!(clip.bytes, b"ID3fake-mp3");
        assert_eq!(clip.format, AudioFormat::Ogg);

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("POST /v1/text:synthesize?key=k123 "));
        assert!(requests[0].contains("\"text\":\"Hi there\""));
    }

    #[test]
    fn surfaces_api_error_messages() {
        let (url, server) = test_server::serve(vec![(
            429,
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#
                .to_string(),
        )]);

        let mut client =
            ApiClient::new(url, Auth::Bearer("tok".into()), Duration::from_secs(5)).unwrap();
        let err = client.list_voices(Some("en-US")).unwrap_err();
        match &err {
            GoogleTtsError::Api { status, message } => {
                assert_eq!(*status, 429);
                assert_eq!(message, "Quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_transient());

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("GET /v1/voices?languageCode=en-US "));
        assert!(requests[0]
            .to_ascii_lowercase()
            .contains("authorization: bearer tok"));
    }
}
