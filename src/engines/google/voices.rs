use serde::Deserialize;

use crate::{VoiceGender, VoiceInfo};

/// A voice as returned by `GET /v1/voices`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVoice {
    pub name: String,
    #[serde(default)]
    pub language_codes: Vec<String>,
    #[serde(default)]
    pub ssml_gender: Option<String>,
    #[serde(default)]
    pub natural_sample_rate_hertz: Option<u32>,
}

impl From<ApiVoice> for VoiceInfo {
    fn from(voice: ApiVoice) -> Self {
        // SSML_VOICE_GENDER_UNSPECIFIED and unknown values map to None.
        let gender = voice
            .ssml_gender
            .as_deref()
            .and_then(|g| g.parse::<VoiceGender>().ok());
        VoiceInfo {
            name: voice.name,
            language_codes: voice.language_codes,
            gender,
            natural_sample_rate_hertz: voice.natural_sample_rate_hertz,
        }
    }
}

/// Keep voices that speak `language_code`, sorted by name.
///
/// Matching is case-insensitive and a bare language (`en`) matches every
/// region (`en-US`, `en-GB`, ...).
pub fn filter_voices(voices: Vec<VoiceInfo>, language_code: Option<&str>) -> Vec<VoiceInfo> {
    let mut voices: Vec<VoiceInfo> = match language_code {
        Some(language) => voices
            .into_iter()
            .filter(|v| v.language_codes.iter().any(|c| language_matches(c, language)))
            .collect(),
        None => voices,
    };
    voices.sort_by(|a, b| a.name.cmp(&b.name));
    voices
}

fn language_matches(code: &str, wanted: &str) -> bool {
    if code.eq_ignore_ascii_case(wanted) {
        return true;
    }
    !wanted.contains('-')
        && code
            .split_once('-')
            .map_or(false, |(language, _)| language.eq_ignore_ascii_case(wanted))
}
