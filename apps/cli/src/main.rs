//! Castbridge CLI - drive networked speakers from the command line.
//!
//! This binary exposes the adapter's transport and discovery surface
//! directly: list and select speakers, start a file playing, and issue
//! pause/resume/seek/volume commands, all through the same core library a
//! host media framework embeds.

mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use castbridge_core::{
    bootstrap_services, select_speaker, Action, Config, ControlTransport, PlaybackEvents,
    PlayerRegistry, SavedSettings, Services, TokioSpawner, Track,
};
use clap::{Parser, Subcommand};
use parking_lot::RwLock;
use tokio::signal;
use tokio::sync::Notify;

use crate::prompt::StdinPrompt;

/// Castbridge - networked speaker control through an external CLI.
#[derive(Parser, Debug)]
#[command(name = "castbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Control utility executable.
    #[arg(long, env = "CASTBRIDGE_COMMAND")]
    command: Option<String>,

    /// Fixed flag prepended to every control invocation (repeatable).
    #[arg(long = "shared-arg", value_name = "ARG")]
    shared_args: Vec<String>,

    /// Discovery utility executable.
    #[arg(long, env = "CASTBRIDGE_DISCOVER_COMMAND")]
    discover_command: Option<String>,

    /// Fixed flag for the discovery invocation (repeatable).
    #[arg(long = "discover-arg", value_name = "ARG")]
    discover_args: Vec<String>,

    /// Speaker to target (name, address, or `_all_`).
    #[arg(short, long, env = "CASTBRIDGE_SPEAKER")]
    speaker: Option<String>,

    /// Data directory for persistent settings (selected speaker).
    #[arg(short = 'd', long, env = "CASTBRIDGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "CASTBRIDGE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command_action: CommandAction,
}

#[derive(Subcommand, Debug)]
enum CommandAction {
    /// List discoverable speakers.
    Speakers {
        /// Re-run discovery even if a cached list exists.
        #[arg(long)]
        refresh: bool,
    },
    /// Pick the default speaker interactively.
    Select,
    /// Play a local audio file and wait for it to finish.
    Play {
        /// Path to the audio file.
        file: PathBuf,
    },
    /// Stop playback on the target speaker.
    Stop,
    /// Pause playback on the target speaker.
    Pause,
    /// Resume playback on the target speaker.
    Resume,
    /// Seek by a signed number of seconds.
    Seek {
        /// Positive seeks forward, negative seeks back.
        #[arg(allow_hyphen_values = true)]
        offset: i64,
    },
    /// Seek to an absolute position in seconds.
    SeekTo {
        /// Position from the start of the track.
        position: u64,
    },
    /// Change volume by a signed amount.
    Volume {
        /// Positive raises, negative lowers.
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
}

/// Event sink that flags track completion so `play` can wait for it.
struct PlayUntilDone {
    done: Notify,
}

impl PlaybackEvents for PlayUntilDone {
    fn player_started(&self, track: &Track) {
        log::info!("Playing {}", track.location());
    }

    fn track_ended(&self) {
        self.done.notify_one();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    // Build configuration: defaults, persisted settings, then CLI overrides
    let mut config = Config::default();
    if let Some(ref data_dir) = args.data_dir {
        if let Some(speaker) = SavedSettings::load(data_dir).default_speaker {
            config.default_speaker = speaker;
        }
    }
    if let Some(command) = args.command {
        config.command = command;
    }
    if !args.shared_args.is_empty() {
        config.shared_args = args.shared_args.clone();
    }
    if let Some(discover_command) = args.discover_command {
        config.discover_command = discover_command;
    }
    if !args.discover_args.is_empty() {
        config.discover_args = args.discover_args.clone();
    }
    if let Some(speaker) = args.speaker {
        config.default_speaker = speaker;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Invalid configuration")?;

    let events = Arc::new(PlayUntilDone {
        done: Notify::new(),
    });
    let registry = Arc::new(RwLock::new(PlayerRegistry::default()));
    let services = bootstrap_services(
        config,
        registry,
        Arc::clone(&events) as Arc<dyn PlaybackEvents>,
        TokioSpawner::current(),
    );

    match args.command_action {
        CommandAction::Speakers { refresh } => {
            let speakers = if refresh {
                services.directory.refresh()
            } else {
                services.directory.speakers()
            }
            .context("Speaker discovery failed")?;
            for speaker in speakers {
                println!("{speaker}");
            }
        }
        CommandAction::Select => {
            let chosen = select_speaker(&services.directory, &services.config, &StdinPrompt)
                .context("Speaker selection failed")?;
            match chosen {
                Some(speaker) => {
                    if let Some(ref data_dir) = args.data_dir {
                        SavedSettings::store_speaker_atomic(data_dir, &speaker)
                            .context("Failed to persist the selected speaker")?;
                    }
                    println!("{speaker}");
                }
                None => bail!("selection aborted"),
            }
        }
        CommandAction::Play { file } => {
            play_until_done(&services, &events, file).await?;
        }
        CommandAction::Stop => {
            // A fresh CLI process tracks no local playback, so this is the
            // bare speaker-side stop command.
            let speaker = services.config.read().default_speaker.clone();
            services
                .runner
                .dispatch(Action::Stop, &[], &speaker)
                .await
                .context("Stop failed")?;
        }
        CommandAction::Pause => services.controller.pause().await.context("Pause failed")?,
        CommandAction::Resume => services.controller.resume().await.context("Resume failed")?,
        CommandAction::Seek { offset } => {
            services
                .controller
                .seek(offset)
                .await
                .context("Seek failed")?;
        }
        CommandAction::SeekTo { position } => {
            services
                .controller
                .seek_to(position)
                .await
                .context("Seek failed")?;
        }
        CommandAction::Volume { amount } => {
            let speaker = services.config.read().default_speaker.clone();
            services
                .runner
                .dispatch(Action::RelativeVolume, &[amount.to_string()], &speaker)
                .await
                .context("Volume change failed")?;
        }
    }

    Ok(())
}

/// Starts the file and waits until the control process exits or the user
/// interrupts, in which case playback is stopped cleanly.
async fn play_until_done(
    services: &Services,
    events: &Arc<PlayUntilDone>,
    file: PathBuf,
) -> Result<()> {
    let track = Track::file(file.to_string_lossy().into_owned());
    services
        .controller
        .start(&track)
        .await
        .context("Playback failed to start")?;

    tokio::select! {
        _ = events.done.notified() => {
            log::info!("Track ended");
        }
        _ = shutdown_signal() => {
            log::info!("Interrupted, stopping playback");
            services.controller.stop().await.context("Stop failed")?;
        }
    }
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
