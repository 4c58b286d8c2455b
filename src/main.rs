//! linkpace front end: real-time playback, offline render and device listing.
//!
//! # Usage
//!
//! ```bash
//! linkpace play --seconds 10
//! linkpace play --clock-bpm 120
//! linkpace play --midi-port "M8"
//! linkpace render --frames 600 --out tone.wav
//! linkpace devices
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lp_master::{Config, Controller, MidiMessage, MidiPort, MidiSender};

#[derive(Parser)]
#[command(name = "linkpace")]
#[command(author, version, about = "Audio-clocked frame pacing with MIDI link sync")]
struct Args {
    /// Config file (TOML); defaults apply when absent
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play the test tone through the default output device
    Play {
        /// Stop after this many seconds (default: run until interrupted)
        #[arg(long)]
        seconds: Option<u64>,

        /// Drive the link port from an external MIDI input (prefers a port named "M8")
        #[arg(long)]
        midi: bool,

        /// Open the MIDI input with this name (implies --midi)
        #[arg(long, value_name = "NAME")]
        midi_port: Option<String>,

        /// Drive the link port from an internal MIDI clock at this tempo,
        /// or fall back to it when the MIDI input cannot be opened
        #[arg(long)]
        clock_bpm: Option<u32>,
    },
    /// Render video frames offline to a WAV file
    Render {
        /// Number of video frames to run
        #[arg(long, default_value = "600")]
        frames: u64,

        /// Output WAV path
        #[arg(long, short = 'o')]
        out: PathBuf,
    },
    /// List audio output devices and MIDI inputs
    Devices,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())
        .with_context(|| match &args.config {
            Some(path) => format!("loading config {}", path.display()),
            None => "loading default config".to_string(),
        })?;

    match args.command {
        Command::Play {
            seconds,
            midi,
            midi_port,
            clock_bpm,
        } => {
            let link = match (midi || midi_port.is_some(), clock_bpm) {
                (true, fallback) => LinkSource::Input {
                    port: midi_port,
                    fallback,
                },
                (false, Some(bpm)) => LinkSource::Clock(bpm),
                (false, None) => LinkSource::None,
            };
            play(config, seconds, link)
        }
        Command::Render { frames, out } => render(config, frames, &out),
        Command::Devices => devices(),
    }
}

/// Where link-port MIDI messages come from during playback.
enum LinkSource {
    None,
    Clock(u32),
    Input {
        port: Option<String>,
        fallback: Option<u32>,
    },
}

fn play(config: Config, seconds: Option<u64>, link: LinkSource) -> Result<()> {
    let mut ctrl = Controller::new(config);
    ctrl.play().context("starting playback")?;
    println!(
        "Playing at {} Hz...",
        ctrl.output_rate().unwrap_or_default()
    );

    let mut midi = None;
    let mut input = None;
    if !matches!(link, LinkSource::None) {
        let sender = ctrl
            .take_midi_sender()
            .context("MIDI input already taken")?;
        match link {
            LinkSource::Input { port, fallback } => match (MidiPort::find(port.as_deref()), fallback) {
                (Ok(found), _) => {
                    let name = found.name().to_string();
                    let link = found
                        .connect(sender)
                        .with_context(|| format!("opening MIDI input {}", name))?;
                    println!("MIDI input: {}", link.port_name());
                    input = Some(link);
                }
                (Err(e), Some(bpm)) => {
                    tracing::warn!("{}; using internal clock at {} BPM", e, bpm);
                    midi = Some(MidiClock::start(sender, bpm));
                }
                (Err(e), None) => return Err(e).context("opening MIDI input"),
            },
            LinkSource::Clock(bpm) => midi = Some(MidiClock::start(sender, bpm)),
            LinkSource::None => {}
        }
    }

    let start = Instant::now();
    let limit = seconds.map(Duration::from_secs);
    while ctrl.is_playing() && limit.map_or(true, |l| start.elapsed() < l) {
        if let Some(clock) = midi.as_mut() {
            clock.pump();
        }
        if let Some(stats) = ctrl.stats() {
            print!(
                "\rFrames: {:6} | Presented: {:6} | Skipped: {:4}",
                stats.frames(),
                stats.presented,
                stats.skipped
            );
            let _ = std::io::stdout().flush();
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    if let Some(mut clock) = midi {
        clock.sender.send(MidiMessage::Stop);
        // Give the loop one frame to drain the stop.
        std::thread::sleep(Duration::from_millis(20));
    }
    if let Some(link) = input {
        link.close();
    }
    ctrl.stop();
    println!("\rDone.                                          ");
    Ok(())
}

/// 24 clocks per quarter note, emitted from the polling loop.
struct MidiClock {
    sender: MidiSender,
    interval: Duration,
    next: Instant,
}

impl MidiClock {
    /// Send Start and begin clocking.
    fn start(mut sender: MidiSender, bpm: u32) -> Self {
        sender.send(MidiMessage::Start);
        let interval = Duration::from_secs(60) / (bpm.max(1) * 24);
        Self {
            sender,
            interval,
            next: Instant::now(),
        }
    }

    fn pump(&mut self) {
        let now = Instant::now();
        while self.next <= now {
            self.sender.send(MidiMessage::Clock);
            self.next += self.interval;
        }
    }
}

fn render(config: Config, frames: u64, out: &Path) -> Result<()> {
    let rate = config.audio.rate;
    let ctrl = Controller::new(config);
    println!("Rendering {} frames to {} at {} Hz...", frames, out.display(), rate);

    let wav = ctrl.render_to_wav(frames);
    std::fs::write(out, &wav).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(bytes = wav.len(), path = %out.display(), "wrote wav");
    Ok(())
}

fn devices() -> Result<()> {
    let names = lp_audio::output_device_names().context("enumerating output devices")?;
    println!("Audio outputs:");
    if names.is_empty() {
        println!("  (none)");
    }
    for name in names {
        println!("  {}", name);
    }

    println!("MIDI inputs:");
    match lp_master::midi_input_names() {
        Ok(names) if names.is_empty() => println!("  (none)"),
        Ok(names) => {
            for name in names {
                let marker = if name == lp_master::PREFERRED_PORT { " (preferred)" } else { "" };
                println!("  {}{}", name, marker);
            }
        }
        Err(e) => println!("  unavailable: {}", e),
    }
    Ok(())
}
