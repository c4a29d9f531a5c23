//! Sequential file-to-audio orchestration.
//!
//! For each input file the [`Pipeline`] reads the text, segments it, turns
//! the chunks into synthesis inputs and writes one audio file per input.
//! Transient engine failures are retried with exponential backoff; a file
//! that still fails is recorded and the run moves on to the next file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Settings;
use crate::text::{prepare_inputs, InputOptions, Segmenter, SsmlError};
use crate::{AudioClip, AudioFormat, SynthesisEngine, SynthesisInput};

const RETRY_BASE: Duration = Duration::from_secs(1);
const RETRY_MAX: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to build SSML: {0}")]
    Ssml(#[from] SsmlError),
    #[error("Synthesis of chunk {index} failed after {attempts} attempt(s): {message}")]
    Synthesis {
        index: usize,
        attempts: u32,
        message: String,
    },
    #[error("No input files to process")]
    NoInputs,
}

/// Bounded retries with doubling delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per chunk, including the first. At least 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::DEFAULT_MAX_ATTEMPTS,
            initial_backoff: RETRY_BASE,
            max_backoff: RETRY_MAX,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.max_backoff)
    }
}

/// Where each chunk's audio goes:
/// `<output_dir>/<stem>/<stem>_<index>[_<voice>].<ext>`.
///
/// `index` counts the chunks actually synthesized for a file, from 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    pub output_dir: PathBuf,
    pub format: AudioFormat,
    /// Appended to each file name when set.
    pub voice: Option<String>,
}

impl OutputNaming {
    pub fn from_settings(settings: &Settings) -> Self {
        let voice = if settings.voice_in_filename {
            settings.voice_name.clone()
        } else {
            None
        };
        Self {
            output_dir: settings.output_dir.clone(),
            format: settings.output_format,
            voice,
        }
    }

    fn stem(input: &Path) -> String {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "output".to_string())
    }

    pub fn dir_for(&self, input: &Path) -> PathBuf {
        self.output_dir.join(Self::stem(input))
    }

    pub fn path_for(&self, input: &Path, index: usize) -> PathBuf {
        let stem = Self::stem(input);
        let name = match &self.voice {
            Some(voice) => format!("{stem}_{index}_{voice}.{}", self.format.extension()),
            None => format!("{stem}_{index}.{}", self.format.extension()),
        };
        self.output_dir.join(&stem).join(name)
    }
}

/// Outcome of one successfully processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub input: PathBuf,
    /// Chunks produced by the segmenter, markers included.
    pub chunks: usize,
    /// Audio files written, in order.
    pub outputs: Vec<PathBuf>,
    /// Retries spent across all chunks.
    pub retries: u32,
    /// Total audio length, when every clip could be measured.
    pub audio_secs: Option<f64>,
}

/// Outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
    pub failures: Vec<(PathBuf, PipelineError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn files_written(&self) -> usize {
        self.reports.iter().map(|r| r.outputs.len()).sum()
    }
}

/// Drives an engine over input files, one chunk at a time.
pub struct Pipeline<E: SynthesisEngine> {
    engine: E,
    params: E::SynthesisParams,
    segmenter: Segmenter,
    input_options: InputOptions,
    naming: OutputNaming,
    retry: RetryPolicy,
}

impl<E> Pipeline<E>
where
    E: SynthesisEngine,
    E::SynthesisParams: Clone,
{
    pub fn new(engine: E, params: E::SynthesisParams, settings: &Settings) -> Self {
        Self {
            engine,
            params,
            segmenter: Segmenter::new(settings.max_chunk_length),
            input_options: settings.input_options(),
            naming: OutputNaming::from_settings(settings),
            retry: RetryPolicy::new(settings.max_attempts),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn naming(&self) -> &OutputNaming {
        &self.naming
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Process every file in order. Failures are logged and collected.
    pub fn run<P: AsRef<Path>>(&mut self, inputs: &[P]) -> RunSummary {
        let mut summary = RunSummary::default();
        if inputs.is_empty() {
            log::warn!("{}", PipelineError::NoInputs);
            return summary;
        }

        for input in inputs {
            let input = input.as_ref();
            match self.process_file(input) {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    log::error!("Failed to process {}: {}", input.display(), e);
                    summary.failures.push((input.to_path_buf(), e));
                }
            }
        }

        log::info!(
            "Processed {} file(s): {} audio file(s) written, {} failure(s)",
            inputs.len(),
            summary.files_written(),
            summary.failures.len()
        );
        summary
    }

    /// Segment, synthesize and write one file.
    pub fn process_file(&mut self, input: &Path) -> Result<FileReport, PipelineError> {
        log::info!("Processing {}", input.display());
        let text = fs::read_to_string(input).map_err(|source| PipelineError::Read {
            path: input.to_path_buf(),
            source,
        })?;

        let chunks = self.segmenter.split(&text);
        let prepared = prepare_inputs(&chunks, &self.input_options)?;
        log::debug!(
            "{}: {} chunk(s), {} to synthesize",
            input.display(),
            chunks.len(),
            prepared.len()
        );

        let mut report = FileReport {
            input: input.to_path_buf(),
            chunks: chunks.len(),
            outputs: Vec::with_capacity(prepared.len()),
            retries: 0,
            audio_secs: Some(0.0),
        };
        if prepared.is_empty() {
            log::warn!("{} contains no text to synthesize", input.display());
            report.audio_secs = None;
            return Ok(report);
        }

        let dir = self.naming.dir_for(input);
        fs::create_dir_all(&dir).map_err(|source| PipelineError::Write {
            path: dir.clone(),
            source,
        })?;

        for (index, item) in prepared.iter().enumerate() {
            if let Some(stamp) = &item.timestamp {
                log::debug!("Chunk {} starts at [{}]", index, stamp);
            }
            let (clip, retries) = self.synthesize_with_retry(&item.input, index)?;
            report.retries += retries;
            match clip.duration_secs() {
                Some(secs) => {
                    log::debug!("Chunk {} is {:.2}s of audio", index, secs);
                    report.audio_secs = report.audio_secs.map(|total| total + secs);
                }
                None => report.audio_secs = None,
            }

            let path = self.naming.path_for(input, index);
            clip.write_to(&path).map_err(|source| PipelineError::Write {
                path: path.clone(),
                source,
            })?;
            log::info!("Wrote {}", path.display());
            report.outputs.push(path);
        }

        Ok(report)
    }

    fn synthesize_with_retry(
        &mut self,
        input: &SynthesisInput,
        index: usize,
    ) -> Result<(AudioClip, u32), PipelineError> {
        let mut attempt = 1;
        loop {
            let err = match self.engine.synthesize(input, Some(self.params.clone())) {
                Ok(clip) => return Ok((clip, attempt - 1)),
                Err(e) => e,
            };

            if !self.engine.is_transient(err.as_ref()) || attempt >= self.retry.max_attempts {
                return Err(PipelineError::Synthesis {
                    index,
                    attempts: attempt,
                    message: err.to_string(),
                });
            }

            let delay = self.retry.delay_for(attempt);
            log::warn!(
                "Chunk {} failed (attempt {}/{}): {}; retrying in {:?}",
                index,
                attempt,
                self.retry.max_attempts,
                err,
                delay
            );
            std::thread::sleep(delay);
            attempt += 1;
        }
    }
}
