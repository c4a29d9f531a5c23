use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::segmenter::{Chunk, ChunkKind};
use super::sentence::{RuleTokenizer, SentenceTokenizer};
use super::ssml::{SsmlBuilder, SsmlError};
use crate::SynthesisInput;

/// Largest input the Text-to-Speech API accepts per request, in bytes.
///
/// Applies to the encoded text or SSML document, markup included.
pub const MAX_INPUT_BYTES: usize = 5000;

static PARAGRAPH_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n\s*").expect("valid regex"));

/// How a chunk sequence is turned into synthesis requests.
#[derive(Debug, Clone, PartialEq)]
pub struct InputOptions {
    /// Send SSML instead of plain text. Markers become `<mark>` elements.
    pub ssml: bool,
    /// In plain-text mode, leave timestamp markers out instead of reading them aloud.
    pub skip_markers: bool,
    /// In SSML mode, insert a `<break>` of this length at blank lines.
    pub paragraph_pause: Option<Duration>,
    /// Inputs whose encoded size exceeds this are split at sentence boundaries.
    pub max_input_bytes: usize,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            ssml: false,
            skip_markers: false,
            paragraph_pause: None,
            max_input_bytes: MAX_INPUT_BYTES,
        }
    }
}

/// One synthesis request derived from the chunk sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChunk {
    /// Position of the originating chunk in the sequence.
    pub chunk_index: usize,
    /// The timestamp marker that precedes this text, if any.
    pub timestamp: Option<String>,
    pub input: SynthesisInput,
}

/// Convert chunks into synthesis inputs, preserving order.
///
/// Whitespace-only text is never sent. A marker with no text after it is
/// dropped in SSML mode. A chunk whose encoded input would exceed
/// `max_input_bytes` is sent as several inputs, split between sentences;
/// only a single sentence over the limit is sent as-is.
pub fn prepare_inputs(
    chunks: &[Chunk],
    options: &InputOptions,
) -> Result<Vec<PreparedChunk>, SsmlError> {
    let mut prepared = Vec::new();
    let mut pending_marker: Option<String> = None;

    for (chunk_index, chunk) in chunks.iter().enumerate() {
        match chunk.kind {
            ChunkKind::Marker => {
                let stamp = chunk.timestamp().unwrap_or(&chunk.text).to_string();
                if options.ssml {
                    if let Some(dropped) = pending_marker.replace(stamp) {
                        log::debug!("Marker [{dropped}] has no text after it, skipping");
                    }
                } else if options.skip_markers {
                    pending_marker = Some(stamp);
                } else {
                    prepared.push(PreparedChunk {
                        chunk_index,
                        timestamp: Some(stamp),
                        input: SynthesisInput::Text(chunk.text.clone()),
                    });
                }
            }
            ChunkKind::Text => {
                let text = chunk.text.trim();
                if text.is_empty() {
                    continue;
                }
                let timestamp = pending_marker.take();
                let inputs = fit_inputs(text, timestamp.as_deref(), options)?;
                if inputs.len() > 1 {
                    log::debug!(
                        "Chunk {} exceeds {} bytes once encoded, sending it as {} requests",
                        chunk_index,
                        options.max_input_bytes,
                        inputs.len()
                    );
                }
                for (piece, input) in inputs.into_iter().enumerate() {
                    prepared.push(PreparedChunk {
                        chunk_index,
                        timestamp: if piece == 0 { timestamp.clone() } else { None },
                        input,
                    });
                }
            }
        }
    }

    Ok(prepared)
}

fn input_len(input: &SynthesisInput) -> usize {
    input.as_str().len()
}

/// Render `text`, splitting it between sentences until every piece fits.
/// The mark goes on the first piece only.
fn fit_inputs(
    text: &str,
    mark: Option<&str>,
    options: &InputOptions,
) -> Result<Vec<SynthesisInput>, SsmlError> {
    let whole = render(text, mark, options)?;
    if input_len(&whole) <= options.max_input_bytes {
        return Ok(vec![whole]);
    }

    let spans = RuleTokenizer::new().sentence_spans(text);
    let mut inputs = Vec::new();
    let mut current: Option<(usize, SynthesisInput)> = None;

    for span in spans {
        current = match current {
            None => {
                let piece_mark = if inputs.is_empty() { mark } else { None };
                Some((span.start, render(&text[span], piece_mark, options)?))
            }
            Some((start, rendered)) => {
                let piece_mark = if inputs.is_empty() { mark } else { None };
                let candidate = render(&text[start..span.end], piece_mark, options)?;
                if input_len(&candidate) <= options.max_input_bytes {
                    Some((start, candidate))
                } else {
                    inputs.push(rendered);
                    Some((span.start, render(&text[span], None, options)?))
                }
            }
        };
    }

    if let Some((_, rendered)) = current {
        inputs.push(rendered);
    }
    if inputs.is_empty() {
        inputs.push(whole);
    }
    Ok(inputs)
}

fn render(
    text: &str,
    mark: Option<&str>,
    options: &InputOptions,
) -> Result<SynthesisInput, SsmlError> {
    if options.ssml {
        Ok(SynthesisInput::Ssml(to_ssml(text, mark, options.paragraph_pause)?))
    } else {
        Ok(SynthesisInput::Text(text.to_string()))
    }
}

fn to_ssml(
    text: &str,
    mark: Option<&str>,
    paragraph_pause: Option<Duration>,
) -> Result<String, SsmlError> {
    let mut builder = SsmlBuilder::new();
    if let Some(mark) = mark {
        builder.mark(mark);
    }

    match paragraph_pause {
        Some(pause) => {
            for (i, paragraph) in PARAGRAPH_BREAK_RE.split(text).enumerate() {
                if i > 0 {
                    builder.pause(pause);
                }
                builder.text(paragraph);
            }
        }
        None => {
            builder.text(text);
        }
    }

    builder.build()
}
