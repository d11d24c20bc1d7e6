// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::{info, Level};

use pianola::config::{validate_song, PlayerConfig, SongWatcher};
use pianola::control::{KeyboardController, PianoKeys};
use pianola::midi::{print_sources, MidiKeyboard};
use pianola::playback::{PlaybackCore, PlaybackMode, TimelineHandoff};
use pianola::timeline::{note_name, Timeline};
use pianola::timing::{Clock, SystemClock};
use pianola::ui::{format_time, App, Session, UiState};

fn print_usage() {
    println!("pianola - practise songs on a virtual piano");
    println!();
    println!("Usage: pianola [OPTIONS] [SONG.yaml]");
    println!();
    println!("Without a song file the built-in demo is loaded.");
    println!();
    println!("Options:");
    println!("  --learn                 Start in learning mode (wait for each note)");
    println!("  --present               Start in presentation mode (play the song)");
    println!("  --tempo <M>             Initial tempo multiplier");
    println!("  --config <FILE>         Player settings (TOML)");
    println!("  --midi <N>              Connect MIDI input source N");
    println!("  --list-midi             List available MIDI sources (inputs)");
    println!("  --check <SONG>          Validate a song file and print a summary");
    println!("  --watch                 Reload the song when the file changes");
    println!("  --log <FILE>            Log file (default: pianola.log)");
    println!("  --verbose               Log debug messages");
    println!("  --help                  Show this help message");
}

/// Options for an interactive session
#[derive(Debug, Default)]
struct Options {
    song: Option<PathBuf>,
    mode: Option<PlaybackMode>,
    tempo: Option<f64>,
    config: Option<PathBuf>,
    midi: Option<usize>,
    watch: bool,
    log: Option<PathBuf>,
    verbose: bool,
}

enum Command {
    Play(Options),
    ListMidi,
    Check(PathBuf),
    Help,
}

/// Fetch the value following an option
fn value<'a>(args: &mut impl Iterator<Item = &'a String>, option: &str) -> Result<&'a String> {
    args.next()
        .ok_or_else(|| anyhow!("{} requires a value", option))
}

fn parse_args(args: &[String]) -> Result<Command> {
    let mut options = Options::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--list-midi" => return Ok(Command::ListMidi),
            "--check" => {
                let path = value(&mut iter, "--check")?;
                return Ok(Command::Check(PathBuf::from(path)));
            }
            "--learn" => options.mode = Some(PlaybackMode::Learning),
            "--present" => options.mode = Some(PlaybackMode::Presentation),
            "--tempo" => {
                let text = value(&mut iter, "--tempo")?;
                let tempo: f64 = text
                    .parse()
                    .map_err(|_| anyhow!("Invalid tempo multiplier: {}", text))?;
                options.tempo = Some(tempo);
            }
            "--config" => options.config = Some(PathBuf::from(value(&mut iter, "--config")?)),
            "--midi" => {
                let text = value(&mut iter, "--midi")?;
                let source: usize = text
                    .parse()
                    .map_err(|_| anyhow!("Invalid source number: {}", text))?;
                options.midi = Some(source);
            }
            "--watch" => options.watch = true,
            "--log" => options.log = Some(PathBuf::from(value(&mut iter, "--log")?)),
            "--verbose" | "-v" => options.verbose = true,
            other if other.starts_with('-') => return Err(anyhow!("Unknown option: {}", other)),
            song => {
                if options.song.is_some() {
                    return Err(anyhow!("Only one song file can be given"));
                }
                options.song = Some(PathBuf::from(song));
            }
        }
    }

    Ok(Command::Play(options))
}

fn init_logging(path: Option<&PathBuf>, verbose: bool) -> Result<()> {
    let path = path.cloned().unwrap_or_else(|| PathBuf::from("pianola.log"));
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file: {:?}", path))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();
    Ok(())
}

fn check_song(path: &PathBuf) -> Result<()> {
    let song = validate_song(path)?;
    let timeline = song.to_timeline()?;

    println!("{}: OK", path.display());
    println!("  Name:     {}", song.song.name);
    println!("  Notes:    {}", timeline.len());
    println!("  Duration: {}", format_time(timeline.total_duration()));
    if let Some((low, high)) = timeline.pitch_range() {
        println!("  Range:    {} - {}", note_name(low), note_name(high));
    }
    println!("  Tempo:    x{:.2}", song.song.tempo);
    if let Some(mode) = song.song.mode {
        println!("  Mode:     {}", mode.label());
    }
    Ok(())
}

fn play(options: Options) -> Result<()> {
    init_logging(options.log.as_ref(), options.verbose)?;

    let config = match &options.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };

    let (song_name, timeline, song_tempo, song_mode) = match &options.song {
        Some(path) => {
            let song = validate_song(path)?;
            let timeline = song.to_timeline()?;
            (song.song.name.clone(), timeline, Some(song.song.tempo), song.song.mode)
        }
        None => ("Ode to Joy".to_string(), Timeline::demo(), None, None),
    };

    let mode = options
        .mode
        .or(song_mode)
        .unwrap_or(config.playback.mode);
    let tempo = options
        .tempo
        .or(song_tempo)
        .unwrap_or(config.tempo.initial);

    let clock = SystemClock::new();
    let mut core = PlaybackCore::new(timeline, mode).with_tempo_range(config.tempo_range());
    core.set_tempo(tempo, clock.now());

    let keyboard = KeyboardController::with_steps(
        PianoKeys::new(config.ui.base_pitch),
        config.tempo.step,
        config.playback.seek_step,
    );

    let mut session = Session::new(core, clock, keyboard);
    session.song_name = song_name;
    session.lookahead = config.ui.lookahead;

    if let Some(source) = options.midi.or(config.midi.input) {
        session.midi = Some(MidiKeyboard::connect(source)?);
    }

    if options.watch {
        let path = options
            .song
            .as_ref()
            .ok_or_else(|| anyhow!("--watch needs a song file"))?;
        let (sender, handoff) = TimelineHandoff::channel();
        session.core.attach_handoff(handoff);
        session.watcher = Some(SongWatcher::new(path, None, Some(sender))?);
        info!(path = ?path, "watching song file");
    }

    let mut app = App::new(UiState::new(session.core.snapshot(), session.song_name.clone()))?;
    app.set_frame_rate(config.ui.frame_rate);
    app.run(&mut session)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match parse_args(&args) {
        Ok(Command::Play(options)) => play(options)?,
        Ok(Command::ListMidi) => print_sources()?,
        Ok(Command::Check(path)) => check_song(&path)?,
        Ok(Command::Help) => print_usage(),
        Err(e) => {
            eprintln!("Error: {}", e);
            println!("Run with --help for usage information");
            std::process::exit(1);
        }
    }

    Ok(())
}
