use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use text2speech::{AudioFormat, VoiceInfo};

/// Line-based questions on a terminal. Invalid answers are asked again.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed while waiting for an answer");
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    pub fn credentials_path(&mut self) -> Result<PathBuf> {
        loop {
            let answer = self.ask("Path to service account JSON key")?;
            if answer.is_empty() {
                continue;
            }
            let path = PathBuf::from(&answer);
            if path.is_file() {
                return Ok(path);
            }
            self.say(&format!("File not found: {answer}"))?;
        }
    }

    pub fn language(&mut self, default: &str) -> Result<String> {
        loop {
            let answer = self.ask(&format!("Language code [{default}]"))?;
            if answer.is_empty() {
                return Ok(default.to_string());
            }
            if is_language_code(&answer) {
                return Ok(answer);
            }
            self.say(&format!("Not a language code: {answer} (try en-US)"))?;
        }
    }

    /// Pick a voice by number or name. An empty answer leaves the choice to
    /// the service.
    pub fn voice(&mut self, voices: &[VoiceInfo]) -> Result<Option<String>> {
        if voices.is_empty() {
            self.say("No voices found; the service default will be used.")?;
            return Ok(None);
        }

        self.say("Available voices:")?;
        for (i, voice) in voices.iter().enumerate() {
            let gender = voice
                .gender
                .map(|g| g.to_string())
                .unwrap_or_else(|| "-".to_string());
            self.say(&format!("{:>4}. {} ({})", i + 1, voice.name, gender))?;
        }

        loop {
            let answer = self.ask("Voice number or name (Enter for default)")?;
            if answer.is_empty() {
                return Ok(None);
            }
            if let Ok(n) = answer.parse::<usize>() {
                if (1..=voices.len()).contains(&n) {
                    return Ok(Some(voices[n - 1].name.clone()));
                }
            }
            if let Some(voice) = voices.iter().find(|v| v.name.eq_ignore_ascii_case(&answer)) {
                return Ok(Some(voice.name.clone()));
            }
            self.say(&format!("Invalid choice: {answer}"))?;
        }
    }

    pub fn format(&mut self, default: AudioFormat) -> Result<AudioFormat> {
        let choices = AudioFormat::ALL
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        loop {
            let answer = self.ask(&format!("Output format ({choices}) [{default}]"))?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<AudioFormat>() {
                Ok(format) => return Ok(format),
                Err(e) => self.say(&e)?,
            }
        }
    }
}

/// `en`, `en-US`, `cmn-Hans-CN` and the like.
fn is_language_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let language_ok = parts
        .next()
        .map_or(false, |l| (2..=3).contains(&l.len()) && l.chars().all(|c| c.is_ascii_alphabetic()));
    language_ok
        && parts.all(|p| (2..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}
