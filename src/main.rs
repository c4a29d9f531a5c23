//! text2speech CLI - convert text files to speech audio

mod cli;

use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use cli::args::{Cli, Commands, ProfileCommand, SynthArgs};
use cli::prompt::Prompter;
use text2speech::config::{
    language_from_voice_name, ProfileStore, Settings, SettingsLayer, DEFAULT_LANGUAGE_CODE,
};
use text2speech::engines::google::{GoogleClientParams, GoogleTtsEngine, GoogleVoiceParams};
use text2speech::inputs::collect_inputs;
use text2speech::pipeline::Pipeline;
use text2speech::text::{Segmenter, DEFAULT_MAX_CHUNK_LENGTH};
use text2speech::{AudioFormat, SynthesisEngine};

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Synth(args) => synth(&cli, args),
        Commands::Voices { language, json } => voices(&cli, language.as_deref(), *json),
        Commands::Segment {
            file,
            max_chunk_length,
            json,
        } => segment(file, *max_chunk_length, *json),
        Commands::Profile { command } => profile(&cli, command),
    }
}

fn profile_store(cli: &Cli) -> Result<ProfileStore> {
    match &cli.profile_dir {
        Some(dir) => Ok(ProfileStore::new(dir)),
        None => Ok(ProfileStore::default_location()?),
    }
}

/// Configuration layers, highest priority first: flags, environment, profile.
fn layers(cli: &Cli, flags: SettingsLayer) -> Result<Vec<SettingsLayer>> {
    let env = SettingsLayer::from_env().context("Invalid environment configuration")?;
    let mut layers = vec![flags, env];
    if let Some(name) = &cli.profile {
        let profile = profile_store(cli)?
            .load(name)
            .with_context(|| format!("Failed to load profile '{name}'"))?;
        layers.push(profile);
    }
    Ok(layers)
}

fn resolve(layers: &[SettingsLayer]) -> Result<Settings> {
    let refs: Vec<&SettingsLayer> = layers.iter().collect();
    Settings::resolve(&refs).context("Configuration error")
}

fn connect(settings: &Settings) -> Result<GoogleTtsEngine> {
    let mut engine = GoogleTtsEngine::new();
    engine
        .connect_with_params(GoogleClientParams::from_settings(settings))
        .map_err(|e| anyhow!("Failed to connect: {e}"))?;
    Ok(engine)
}

fn synth(cli: &Cli, args: &SynthArgs) -> Result<()> {
    let inputs = collect_inputs(&args.inputs)?;
    let mut layers = layers(cli, args.to_layer(cli.credentials.clone()))?;

    if args.interactive {
        if io_is_terminal() {
            let answers = prompt_missing(&layers)?;
            layers.insert(0, answers);
        } else {
            log::warn!("--interactive ignored: standard input is not a terminal");
        }
    }

    let settings = resolve(&layers)?;
    log::debug!("Resolved settings: {:?}", settings);

    if let Some(name) = &args.save_profile {
        profile_store(cli)?
            .save(name, &settings.to_layer())
            .with_context(|| format!("Failed to save profile '{name}'"))?;
    }

    let engine = connect(&settings)?;
    let mut pipeline = Pipeline::new(engine, GoogleVoiceParams::from(&settings), &settings);
    let summary = pipeline.run(&inputs);

    if !summary.is_success() {
        bail!(
            "{} of {} file(s) failed",
            summary.failures.len(),
            inputs.len()
        );
    }
    Ok(())
}

fn io_is_terminal() -> bool {
    std::io::stdin().is_terminal()
}

/// Ask for whatever the configuration layers leave open.
fn prompt_missing(layers: &[SettingsLayer]) -> Result<SettingsLayer> {
    let merged = layers
        .iter()
        .cloned()
        .fold(SettingsLayer::default(), SettingsLayer::or);
    let mut prompter = Prompter::stdio();
    let mut answers = SettingsLayer::default();

    if merged.credentials().is_none() {
        answers.credentials_path = Some(prompter.credentials_path()?);
    }

    if merged.voice_name.is_none() {
        let language = match &merged.language_code {
            Some(language) => language.clone(),
            None => {
                let language = prompter.language(DEFAULT_LANGUAGE_CODE)?;
                answers.language_code = Some(language.clone());
                language
            }
        };

        let mut with_answers = vec![answers.clone()];
        with_answers.extend(layers.iter().cloned());
        let mut engine = connect(&resolve(&with_answers)?)?;
        let voices = engine
            .list_voices(Some(&language))
            .map_err(|e| anyhow!("Failed to list voices: {e}"))?;

        answers.voice_name = prompter.voice(&voices)?;
        // A bare language like `en` is narrowed to the chosen voice's region.
        if answers.language_code.is_some() {
            if let Some(voice) = &answers.voice_name {
                if let Some(code) = language_from_voice_name(voice) {
                    answers.language_code = Some(code.to_string());
                }
            }
        }
    }

    if merged.output_format.is_none() {
        answers.output_format = Some(prompter.format(AudioFormat::Mp3)?);
    }

    Ok(answers)
}

fn voices(cli: &Cli, language: Option<&str>, json: bool) -> Result<()> {
    let flags = SettingsLayer {
        credentials_path: cli.credentials.clone(),
        ..Default::default()
    };
    let settings = resolve(&layers(cli, flags)?)?;
    let mut engine = connect(&settings)?;
    let voices = engine
        .list_voices(language)
        .map_err(|e| anyhow!("Failed to list voices: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
        return Ok(());
    }

    if voices.is_empty() {
        println!("No voices found");
        return Ok(());
    }
    for voice in &voices {
        let gender = voice
            .gender
            .map(|g| g.to_string())
            .unwrap_or_else(|| "-".to_string());
        let rate = voice
            .natural_sample_rate_hertz
            .map(|hz| format!("{hz} Hz"))
            .unwrap_or_default();
        println!(
            "{:<32} {:<12} {:<8} {}",
            voice.name,
            voice.language_codes.join(","),
            gender,
            rate
        );
    }
    println!("\n{} voice(s)", voices.len());
    Ok(())
}

fn segment(file: &Path, max_chunk_length: Option<usize>, json: bool) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let max = match max_chunk_length {
        Some(max) => max,
        None => SettingsLayer::from_env()?
            .max_chunk_length
            .unwrap_or(DEFAULT_MAX_CHUNK_LENGTH),
    };
    if max == 0 {
        bail!("--max-chunk-length must be greater than zero");
    }

    let chunks = Segmenter::new(max).split(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }

    for (i, chunk) in chunks.iter().enumerate() {
        let kind = if chunk.is_marker() { "marker" } else { "text" };
        println!("--- chunk {} ({}, {} chars) ---", i, kind, chunk.char_len());
        println!("{}", chunk.text);
    }
    println!("--- {} chunk(s), limit {} ---", chunks.len(), max);
    Ok(())
}

fn profile(cli: &Cli, command: &ProfileCommand) -> Result<()> {
    let store = profile_store(cli)?;
    match command {
        ProfileCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("No profiles in {}", store.dir().display());
            }
            for name in names {
                println!("{name}");
            }
        }
        ProfileCommand::Show { name } => {
            let layer = store
                .load(name)
                .with_context(|| format!("Failed to load profile '{name}'"))?;
            println!("{}", serde_json::to_string_pretty(&layer)?);
        }
    }
    Ok(())
}
