//! Text preparation: segmentation, sentence detection and SSML.
//!
//! The [`Segmenter`] turns a raw document into an ordered [`Chunk`] sequence
//! where every chunk fits a single synthesis request. [`prepare_inputs`] then
//! maps chunks to [`SynthesisInput`](crate::SynthesisInput)s, optionally as
//! SSML with timestamp marks.
//!
//! ```
//! use text2speech::text::segment;
//!
//! let chunks = segment("[00:00:01] Hello world. This is a test.", 1000);
//! assert_eq!(chunks, vec!["[00:00:01]", " Hello world. This is a test."]);
//! ```

pub mod prepare;
pub mod segmenter;
pub mod sentence;
pub mod ssml;

pub use prepare::{prepare_inputs, InputOptions, PreparedChunk, MAX_INPUT_BYTES};
pub use segmenter::{reconstruct, segment, Chunk, ChunkKind, Segmenter, DEFAULT_MAX_CHUNK_LENGTH};
pub use sentence::{RuleTokenizer, SentenceTokenizer};
pub use ssml::{SsmlBuilder, SsmlError};
