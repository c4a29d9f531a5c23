use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::sentence::{RuleTokenizer, SentenceTokenizer};

/// Default maximum chunk length, in characters.
///
/// The API limit is in bytes of the encoded input, so a chunk within this
/// length can still be too large once it holds multi-byte characters or SSML
/// markup. [`prepare_inputs`](super::prepare_inputs) splits such chunks again
/// against [`MAX_INPUT_BYTES`](super::MAX_INPUT_BYTES).
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 5000;

/// Timestamp markers of the form `[HH:MM:SS]`.
static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{2}:\d{2}:\d{2}\]").expect("valid regex"));

/// What a chunk holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// A `[HH:MM:SS]` timestamp marker, always on its own.
    Marker,
    /// Ordinary text.
    Text,
}

/// A contiguous piece of the source document.
///
/// `text` is always exactly `source[start..end]` (byte offsets).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub kind: ChunkKind,
}

impl Chunk {
    fn new(source: &str, start: usize, end: usize, kind: ChunkKind) -> Self {
        Self {
            text: source[start..end].to_string(),
            start,
            end,
            kind,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.kind == ChunkKind::Marker
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// The `HH:MM:SS` inside a marker chunk.
    pub fn timestamp(&self) -> Option<&str> {
        if !self.is_marker() {
            return None;
        }
        self.text.strip_prefix('[')?.strip_suffix(']')
    }
}

/// Splits documents into chunks no longer than a maximum length.
///
/// Timestamp markers are cut out as standalone chunks first. Whatever text
/// lies between them is emitted as-is when it fits; otherwise it is split
/// into sentences which are packed greedily. A single sentence longer than
/// the limit is kept whole rather than truncated.
pub struct Segmenter {
    max_length: usize,
    tokenizer: Box<dyn SentenceTokenizer + Send + Sync>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LENGTH)
    }
}

impl Segmenter {
    /// Create a segmenter with the built-in rule tokenizer.
    ///
    /// A `max_length` of zero is treated as one.
    pub fn new(max_length: usize) -> Self {
        Self::with_tokenizer(max_length, RuleTokenizer::new())
    }

    pub fn with_tokenizer<T>(max_length: usize, tokenizer: T) -> Self
    where
        T: SentenceTokenizer + Send + Sync + 'static,
    {
        Self {
            max_length: max_length.max(1),
            tokenizer: Box::new(tokenizer),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Split `text` into an ordered chunk sequence.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut cursor = 0;

        for marker in MARKER_RE.find_iter(text) {
            self.split_segment(text, cursor, marker.start(), &mut chunks);
            chunks.push(Chunk::new(
                text,
                marker.start(),
                marker.end(),
                ChunkKind::Marker,
            ));
            cursor = marker.end();
        }
        self.split_segment(text, cursor, text.len(), &mut chunks);

        chunks
    }

    fn split_segment(&self, source: &str, start: usize, end: usize, out: &mut Vec<Chunk>) {
        if start == end {
            return;
        }

        let segment = &source[start..end];
        if segment.chars().count() <= self.max_length {
            out.push(Chunk::new(source, start, end, ChunkKind::Text));
            return;
        }

        let spans = self.tokenizer.sentence_spans(segment);
        if spans.is_empty() {
            // Whitespace only; keep it so nothing is lost.
            out.push(Chunk::new(source, start, end, ChunkKind::Text));
            return;
        }

        let mut current: Option<(usize, usize)> = None;
        for span in spans {
            let (s_start, s_end) = (start + span.start, start + span.end);
            current = match current {
                None => Some((s_start, s_end)),
                Some((c_start, _)) if source[c_start..s_end].chars().count() <= self.max_length => {
                    Some((c_start, s_end))
                }
                Some((c_start, c_end)) => {
                    out.push(Chunk::new(source, c_start, c_end, ChunkKind::Text));
                    Some((s_start, s_end))
                }
            };
        }

        if let Some((c_start, c_end)) = current {
            out.push(Chunk::new(source, c_start, c_end, ChunkKind::Text));
        }
    }
}

/// Split `text` into chunk strings of at most `max_length` characters.
///
/// Convenience wrapper around [`Segmenter::split`].
pub fn segment(text: &str, max_length: usize) -> Vec<String> {
    Segmenter::new(max_length)
        .split(text)
        .into_iter()
        .map(|chunk| chunk.text)
        .collect()
}

/// Rebuild the source document from its chunks by reinserting the gaps
/// between them.
pub fn reconstruct(source: &str, chunks: &[Chunk]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for chunk in chunks {
        out.push_str(&source[cursor..chunk.start]);
        out.push_str(&chunk.text);
        cursor = chunk.end;
    }
    out.push_str(&source[cursor..]);
    out
}
