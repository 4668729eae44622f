//! The adapter's [`Player`] entry.
//!
//! [`SpeakerPlayer`] is what actually sits in the host's player list: a thin
//! delegation layer over [`PlaybackController`] plus the `playable` gate
//! deciding which tracks this adapter offers to handle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::command::CommandRunner;
use crate::error::CastResult;
use crate::host::{Capability, Player, Track, TrackSource};
use crate::playback::PlaybackController;
use crate::state::SharedConfig;

/// Name under which the adapter registers in the host's player list.
pub const PLAYER_NAME: &str = "castbridge";

/// Player entry driving networked speakers through the control utility.
pub struct SpeakerPlayer {
    controller: Arc<PlaybackController>,
    runner: Arc<CommandRunner>,
    config: SharedConfig,
}

impl SpeakerPlayer {
    /// Creates the player entry over a controller and its runner.
    pub fn new(
        controller: Arc<PlaybackController>,
        runner: Arc<CommandRunner>,
        config: SharedConfig,
    ) -> Self {
        Self {
            controller,
            runner,
            config,
        }
    }

    /// The underlying playback controller.
    pub fn controller(&self) -> &Arc<PlaybackController> {
        &self.controller
    }
}

#[async_trait]
impl Player for SpeakerPlayer {
    fn name(&self) -> &'static str {
        PLAYER_NAME
    }

    /// A track is playable iff the control executable resolves on `PATH`,
    /// the track is a local file, and its extension is in the configured
    /// set (case-insensitive).
    fn playable(&self, track: &Track) -> bool {
        if track.source() != TrackSource::File {
            return false;
        }
        let Some(path) = track.path() else {
            return false;
        };
        self.config.read().is_playable_path(path) && self.runner.is_resolvable()
    }

    fn capabilities(&self) -> &[Capability] {
        &[
            Capability::Pause,
            Capability::Resume,
            Capability::Seek,
            Capability::SeekTo,
        ]
    }

    async fn start(&self, track: &Track) -> CastResult<()> {
        self.controller.start(track).await
    }

    async fn stop(&self) -> CastResult<()> {
        self.controller.stop().await
    }

    async fn pause(&self) -> CastResult<()> {
        self.controller.pause().await
    }

    async fn resume(&self) -> CastResult<()> {
        self.controller.resume().await
    }

    async fn seek(&self, offset_secs: i64) -> CastResult<()> {
        self.controller.seek(offset_secs).await
    }

    async fn seek_to(&self, position_secs: u64) -> CastResult<()> {
        self.controller.seek_to(position_secs).await
    }
}
