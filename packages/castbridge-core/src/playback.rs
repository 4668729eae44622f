//! Playback session lifecycle.
//!
//! [`PlaybackController`] owns the single live playback session. Starting a
//! track launches the control utility's `play_file` invocation, pins the
//! speaker target for the whole session, and hands the child process to a
//! monitor task that observes termination. Every other transport action is a
//! fire-and-forget dispatch through the [`ControlTransport`].
//!
//! # Session invariants
//!
//! - At most one live session exists; `start` while live is rejected.
//! - The speaker target is pinned exactly once, at start, and never mutated
//!   mid-session; `pause`/`resume`/`seek`/`seek_to`/`stop` all use it even if
//!   the configured default changes underneath.
//! - `track_ended` is delivered exactly once per session, and only for exits
//!   the controller did not itself cause via `stop`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::command::{render_magnitude, Action, ControlTransport};
use crate::error::{CastError, CastResult};
use crate::host::{PlaybackEvents, Track};
use crate::state::SharedConfig;

/// The live session tracked by the controller.
///
/// The child process itself is owned by the monitor task; the slot keeps the
/// metadata needed to control and tear down the session.
struct Session {
    id: Uuid,
    generation: u64,
    pinned_speaker: String,
    cancel: CancellationToken,
}

type SessionSlot = Arc<Mutex<Option<Session>>>;

/// Drives the one "current" playback through the control utility.
pub struct PlaybackController {
    transport: Arc<dyn ControlTransport>,
    config: SharedConfig,
    events: Arc<dyn PlaybackEvents>,
    session: SessionSlot,
    generation: AtomicU64,
}

impl PlaybackController {
    /// Creates a controller over the given transport, configuration, and
    /// event sink.
    pub fn new(
        transport: Arc<dyn ControlTransport>,
        config: SharedConfig,
        events: Arc<dyn PlaybackEvents>,
    ) -> Self {
        Self {
            transport,
            config,
            events,
            session: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether a playback session is currently live.
    pub fn is_playing(&self) -> bool {
        self.session.lock().is_some()
    }

    /// The speaker pinned by the live session, if any.
    pub fn pinned_speaker(&self) -> Option<String> {
        self.session.lock().as_ref().map(|s| s.pinned_speaker.clone())
    }

    /// Begins playback of a local-file track.
    ///
    /// Pins the current default speaker, launches `play_file` with the
    /// track's path as sole argument, registers the termination monitor, and
    /// signals `player_started` synchronously once the command is issued.
    ///
    /// # Errors
    ///
    /// - [`CastError::PlaybackActive`] if a session is already live; the
    ///   existing process is never implicitly killed.
    /// - [`CastError::NotLocalFile`] for non-file tracks.
    /// - [`CastError::Command`] if the control utility cannot be spawned; no
    ///   session is tracked, so a subsequent `stop` is a no-op.
    pub async fn start(&self, track: &Track) -> CastResult<()> {
        let path = track
            .path()
            .ok_or_else(|| CastError::NotLocalFile(track.location().to_string()))?;
        if let Some(session) = self.session.lock().as_ref() {
            return Err(CastError::PlaybackActive(session.pinned_speaker.clone()));
        }

        let pinned_speaker = self.config.read().default_speaker.clone();
        let mut process = self
            .transport
            .launch(
                Action::PlayFile,
                &[path.to_string_lossy().into_owned()],
                &pinned_speaker,
            )
            .await?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        let session = Session {
            id: Uuid::new_v4(),
            generation,
            pinned_speaker: pinned_speaker.clone(),
            cancel: cancel.clone(),
        };
        let id = session.id;

        let race_lost = {
            let mut slot = self.session.lock();
            if slot.is_some() {
                // Lost a start/start race; the competing session won the
                // slot, so tear our process down without tracking it.
                true
            } else {
                *slot = Some(session);
                false
            }
        };
        if race_lost {
            process.kill().await;
            return Err(CastError::PlaybackActive(pinned_speaker));
        }

        log::info!(
            "[Playback] session {} started on `{}` (pid {:?})",
            id,
            pinned_speaker,
            process.id()
        );

        let slot = Arc::clone(&self.session);
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = process.wait() => false,
            };
            if cancelled {
                process.kill().await;
                log::debug!("[Playback] session {id} killed by stop");
                return;
            }
            // Only the generation that owns the slot may clear it and
            // notify; a stale monitor observing a reused slot is inert.
            let owned = {
                let mut slot = slot.lock();
                match slot.as_ref() {
                    Some(current) if current.generation == generation => {
                        *slot = None;
                        true
                    }
                    _ => false,
                }
            };
            if owned {
                log::info!("[Playback] session {id} ended");
                events.track_ended();
            }
        });

        self.events.player_started(track);
        Ok(())
    }

    /// Ends the live session, if any.
    ///
    /// Takes the session out of the slot first (so the monitor cannot
    /// deliver a spurious `track_ended`), kills the local process via its
    /// cancellation token, then issues a `stop` command so the speaker
    /// itself halts regardless of whether the local process already exited.
    /// No-op when no session is live.
    pub async fn stop(&self) -> CastResult<()> {
        let Some(session) = self.session.lock().take() else {
            return Ok(());
        };
        session.cancel.cancel();
        log::info!(
            "[Playback] session {} stopped on `{}`",
            session.id,
            session.pinned_speaker
        );
        self.transport
            .dispatch(Action::Stop, &[], &session.pinned_speaker)
            .await?;
        Ok(())
    }

    /// Pauses playback on the session's pinned speaker.
    ///
    /// With no live session the command is still forwarded, using the
    /// current default speaker; the external tool decides whether it is
    /// meaningful.
    pub async fn pause(&self) -> CastResult<()> {
        self.dispatch(Action::Pause, &[]).await
    }

    /// Resumes playback on the session's pinned speaker.
    pub async fn resume(&self) -> CastResult<()> {
        self.dispatch(Action::Play, &[]).await
    }

    /// Seeks by a signed offset: non-negative offsets seek forward, negative
    /// offsets seek back, each by the offset's magnitude.
    pub async fn seek(&self, offset_secs: i64) -> CastResult<()> {
        let action = if offset_secs >= 0 {
            Action::SeekForward
        } else {
            Action::SeekBack
        };
        self.dispatch(action, &[render_magnitude(offset_secs)]).await
    }

    /// Seeks to an absolute position in seconds.
    pub async fn seek_to(&self, position_secs: u64) -> CastResult<()> {
        self.dispatch(Action::Seek, &[position_secs.to_string()]).await
    }

    /// The speaker control actions should target right now: the pinned
    /// speaker while a session is live, the configured default otherwise.
    fn control_speaker(&self) -> String {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.pinned_speaker.clone())
            .unwrap_or_else(|| self.config.read().default_speaker.clone())
    }

    async fn dispatch(&self, action: Action, args: &[String]) -> CastResult<()> {
        let speaker = self.control_speaker();
        self.transport.dispatch(action, args, &speaker).await?;
        Ok(())
    }
}
