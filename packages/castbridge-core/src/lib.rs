//! Castbridge Core - control adapter for networked speakers.
//!
//! This crate lets a generic media-playback framework drive networked audio
//! speakers through an external command-line utility instead of direct local
//! audio output. The external tool does the decoding and streaming; this
//! crate does the reliable part around it: lifecycle management of the
//! asynchronous control process, stateful speaker targeting, and
//! non-destructive integration into the host's playback-preference system.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`state`]: Configuration, the "all speakers" sentinel, persisted settings
//! - [`command`]: Control-utility invocations behind the [`ControlTransport`] seam
//! - [`playback`]: The single tracked playback session and its monitor
//! - [`discovery`]: Discovery report parsing and the cached speaker directory
//! - [`host`]: Boundary contracts of the host framework (tracks, players, hooks)
//! - [`integrate`]: The enable/disable preference-integration toggle
//! - [`adapter`]: The adapter's [`Player`](host::Player) entry and its `playable` gate
//! - [`select`]: Exact-match interactive speaker selection
//! - [`runtime`]: Task spawning abstraction for runtime independence
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! Core logic depends on traits rather than concrete externals so every
//! layer is testable without a speaker on the network:
//!
//! - [`ControlTransport`](command::ControlTransport): issuing control invocations
//! - [`DiscoverySource`](discovery::DiscoverySource): producing discovery reports
//! - [`PlaybackEvents`](host::PlaybackEvents): lifecycle notification sink
//! - [`SpeakerPrompt`](select::SpeakerPrompt): asking the user to pick a speaker

#![warn(clippy::all)]

pub mod adapter;
pub mod bootstrap;
pub mod command;
pub mod discovery;
pub mod error;
pub mod host;
pub mod integrate;
pub mod playback;
pub mod runtime;
pub mod select;
pub mod state;

// Re-export commonly used types at the crate root
pub use adapter::{SpeakerPlayer, PLAYER_NAME};
pub use bootstrap::{bootstrap_services, Services};
pub use command::{Action, CommandError, CommandRunner, ControlTransport, PlaybackProcess};
pub use discovery::{
    parse_speaker_table, DiscoveryError, DiscoverySource, ShellDiscovery, SpeakerDirectory,
};
pub use error::{CastError, CastResult, ErrorCode};
pub use host::{
    Capability, NullEvents, PlaybackEvents, Player, PlayerRegistry, PreferenceFn, Track,
    TrackSource, VolumeFn,
};
pub use integrate::PreferenceIntegrator;
pub use playback::PlaybackController;
pub use runtime::{TaskSpawner, TokioSpawner};
pub use select::{select_speaker, SpeakerPrompt};
pub use state::{Config, SavedSettings, SharedConfig, ALL_SPEAKERS, SPEAKER_ENV_VAR};
