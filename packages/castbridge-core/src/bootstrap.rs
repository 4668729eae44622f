//! Service bootstrap.
//!
//! Wires the adapter's components together in dependency order so embedders
//! (the CLI, a host-framework shim) construct one coherent set of services
//! from a configuration and a host event sink.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::adapter::SpeakerPlayer;
use crate::command::{CommandRunner, ControlTransport};
use crate::discovery::SpeakerDirectory;
use crate::host::{PlaybackEvents, Player, PlayerRegistry};
use crate::integrate::PreferenceIntegrator;
use crate::playback::PlaybackController;
use crate::runtime::TokioSpawner;
use crate::state::{Config, SharedConfig};

/// The fully-wired adapter services.
pub struct Services {
    /// Shared configuration handle.
    pub config: SharedConfig,
    /// The control-utility runner.
    pub runner: Arc<CommandRunner>,
    /// The playback controller.
    pub controller: Arc<PlaybackController>,
    /// The speaker directory.
    pub directory: Arc<SpeakerDirectory>,
    /// The adapter's player entry.
    pub player: Arc<SpeakerPlayer>,
    /// The host-integration toggle.
    pub integrator: PreferenceIntegrator,
}

/// Builds all adapter services over the given configuration.
///
/// `registry` is the host framework's player state the integrator will
/// install into; `events` receives playback lifecycle notifications.
pub fn bootstrap_services(
    config: Config,
    registry: Arc<RwLock<PlayerRegistry>>,
    events: Arc<dyn PlaybackEvents>,
    spawner: TokioSpawner,
) -> Services {
    let config = config.into_shared();
    let runner = CommandRunner::arc(Arc::clone(&config));
    let controller = Arc::new(PlaybackController::new(
        Arc::clone(&runner) as Arc<dyn ControlTransport>,
        Arc::clone(&config),
        events,
    ));
    let directory = Arc::new(SpeakerDirectory::with_config(Arc::clone(&config)));
    let player = Arc::new(SpeakerPlayer::new(
        Arc::clone(&controller),
        Arc::clone(&runner),
        Arc::clone(&config),
    ));
    let integrator = PreferenceIntegrator::new(
        registry,
        Arc::clone(&player) as Arc<dyn Player>,
        Arc::clone(&runner) as Arc<dyn ControlTransport>,
        Arc::clone(&config),
        spawner,
    );

    Services {
        config,
        runner,
        controller,
        directory,
        player,
        integrator,
    }
}
