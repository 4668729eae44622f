//! Host-framework boundary contracts.
//!
//! The host media-playback framework itself is out of scope; this module
//! defines the types the adapter needs at that boundary: a track value, the
//! [`Player`] trait with an explicit capability set, the global
//! [`PlayerRegistry`] with its preference and volume hooks, and the
//! [`PlaybackEvents`] notification sink.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CastError, CastResult};

/// Where a track's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSource {
    /// A file on the local filesystem.
    File,
    /// A remote URL (not playable by this adapter).
    Url,
}

/// A track as the host framework presents it: a type tag plus a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    source: TrackSource,
    location: String,
}

impl Track {
    /// A track backed by a local file.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            source: TrackSource::File,
            location: path.into(),
        }
    }

    /// A track backed by a remote URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            source: TrackSource::Url,
            location: url.into(),
        }
    }

    /// The track's type tag.
    pub fn source(&self) -> TrackSource {
        self.source
    }

    /// The raw location string.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The file path, for local-file tracks only.
    pub fn path(&self) -> Option<&Path> {
        match self.source {
            TrackSource::File => Some(Path::new(&self.location)),
            TrackSource::Url => None,
        }
    }
}

/// Optional transport capabilities a player may support.
///
/// Capability presence is declared explicitly rather than probed per method,
/// so hosts can render controls without calling and catching `Unsupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Supports `pause`.
    Pause,
    /// Supports `resume`.
    Resume,
    /// Supports relative `seek`.
    Seek,
    /// Supports absolute `seek_to`.
    SeekTo,
}

/// A player entry in the host framework's player list.
///
/// `start`, `stop`, and `playable` are mandatory; the transport extras are
/// optional and default to [`CastError::Unsupported`], gated by
/// [`capabilities`](Player::capabilities).
#[async_trait]
pub trait Player: Send + Sync {
    /// Stable name identifying this player in the host's list.
    fn name(&self) -> &'static str;

    /// Whether this player can handle the given track.
    fn playable(&self, track: &Track) -> bool;

    /// The optional operations this player supports.
    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    /// Whether a specific optional operation is supported.
    fn supports(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Begins playback of the track.
    async fn start(&self, track: &Track) -> CastResult<()>;

    /// Ends playback.
    async fn stop(&self) -> CastResult<()>;

    /// Pauses playback.
    async fn pause(&self) -> CastResult<()> {
        Err(CastError::Unsupported("pause"))
    }

    /// Resumes paused playback.
    async fn resume(&self) -> CastResult<()> {
        Err(CastError::Unsupported("resume"))
    }

    /// Seeks by a signed offset in seconds.
    async fn seek(&self, _offset_secs: i64) -> CastResult<()> {
        Err(CastError::Unsupported("seek"))
    }

    /// Seeks to an absolute position in seconds.
    async fn seek_to(&self, _position_secs: u64) -> CastResult<()> {
        Err(CastError::Unsupported("seek_to"))
    }
}

/// Host hook choosing which candidate player handles a track.
pub type PreferenceFn =
    dyn Fn(&Track, &[Arc<dyn Player>]) -> Option<Arc<dyn Player>> + Send + Sync;

/// Host hook applying a signed volume change.
pub type VolumeFn = dyn Fn(i64) + Send + Sync;

/// The host framework's global player state: an ordered player list plus the
/// active preference-selection and volume-change hooks.
#[derive(Default, Clone)]
pub struct PlayerRegistry {
    /// Ordered list of registered players.
    pub players: Vec<Arc<dyn Player>>,
    /// Active preference-selection function, if any.
    pub preference: Option<Arc<PreferenceFn>>,
    /// Active volume-change function, if any.
    pub volume_change: Option<Arc<VolumeFn>>,
}

impl PlayerRegistry {
    /// Picks the player that should handle `track`.
    ///
    /// Candidates are the registered players reporting the track as playable,
    /// in list order. The preference hook (if installed) chooses among them;
    /// otherwise the first candidate wins.
    pub fn select_player(&self, track: &Track) -> Option<Arc<dyn Player>> {
        let candidates: Vec<Arc<dyn Player>> = self
            .players
            .iter()
            .filter(|player| player.playable(track))
            .cloned()
            .collect();
        if candidates.is_empty() {
            return None;
        }
        match &self.preference {
            Some(prefer) => prefer(track, &candidates),
            None => candidates.first().cloned(),
        }
    }

    /// Applies a signed volume change through the installed hook, if any.
    pub fn change_volume(&self, amount: i64) {
        if let Some(volume_change) = &self.volume_change {
            volume_change(amount);
        }
    }
}

/// Sink for playback lifecycle notifications produced by the adapter.
pub trait PlaybackEvents: Send + Sync {
    /// Playback of `track` has been issued to the control utility.
    ///
    /// Signaled synchronously when the command is launched, not when audio
    /// becomes audible; the external tool's startup latency is invisible to
    /// this layer.
    fn player_started(&self, track: &Track);

    /// The tracked playback process exited for any reason other than an
    /// explicit `stop`. Delivered exactly once per session.
    fn track_ended(&self);
}

/// No-op event sink for hosts that do not consume notifications.
pub struct NullEvents;

impl PlaybackEvents for NullEvents {
    fn player_started(&self, _track: &Track) {}

    fn track_ended(&self) {}
}
