//! Host-framework preference integration.
//!
//! [`PreferenceIntegrator`] is the global toggle that makes the host prefer
//! this adapter: enabling registers the adapter in the host's player list and
//! installs the adapter's preference-selection and volume-change hooks,
//! saving the previous values; disabling restores the saved values verbatim.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::command::{Action, ControlTransport};
use crate::host::{Player, PlayerRegistry, PreferenceFn, VolumeFn};
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::state::SharedConfig;

/// The registry values captured when integration was enabled.
struct Snapshot {
    players: Vec<Arc<dyn Player>>,
    preference: Option<Arc<PreferenceFn>>,
    volume_change: Option<Arc<VolumeFn>>,
}

/// Installs and removes this adapter as the host's preferred player and
/// volume handler.
///
/// The snapshot is taken exactly once per enable; enabling while already
/// enabled is a no-op so the true original configuration can never be
/// overwritten by an already-adapted one.
pub struct PreferenceIntegrator {
    registry: Arc<RwLock<PlayerRegistry>>,
    player: Arc<dyn Player>,
    transport: Arc<dyn ControlTransport>,
    config: SharedConfig,
    spawner: TokioSpawner,
    snapshot: Mutex<Option<Snapshot>>,
}

impl PreferenceIntegrator {
    /// Creates an integrator for the given host registry and adapter player.
    pub fn new(
        registry: Arc<RwLock<PlayerRegistry>>,
        player: Arc<dyn Player>,
        transport: Arc<dyn ControlTransport>,
        config: SharedConfig,
        spawner: TokioSpawner,
    ) -> Self {
        Self {
            registry,
            player,
            transport,
            config,
            spawner,
            snapshot: Mutex::new(None),
        }
    }

    /// Whether integration is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.snapshot.lock().is_some()
    }

    /// Registers the adapter and installs its hooks, snapshotting the
    /// previous registry values. No-op if already enabled.
    pub fn enable(&self) {
        let mut snapshot = self.snapshot.lock();
        if snapshot.is_some() {
            log::warn!("[Integrate] already enabled; keeping the original snapshot");
            return;
        }

        let mut registry = self.registry.write();
        let previous_preference = registry.preference.clone();
        *snapshot = Some(Snapshot {
            players: registry.players.clone(),
            preference: registry.preference.clone(),
            volume_change: registry.volume_change.clone(),
        });

        registry.players.push(Arc::clone(&self.player));
        registry.preference = Some(self.preference_hook(previous_preference));
        registry.volume_change = Some(self.volume_hook());
        log::info!("[Integrate] adapter installed as preferred player");
    }

    /// Restores the player list and both hooks to the snapshotted values.
    /// No-op if not enabled.
    pub fn disable(&self) {
        let Some(saved) = self.snapshot.lock().take() else {
            return;
        };
        let mut registry = self.registry.write();
        registry.players = saved.players;
        registry.preference = saved.preference;
        registry.volume_change = saved.volume_change;
        log::info!("[Integrate] previous player configuration restored");
    }

    /// Preference hook: pick the adapter when the host offers it as a
    /// candidate; otherwise fall through to the previously-installed hook,
    /// or the first candidate when none existed.
    fn preference_hook(&self, previous: Option<Arc<PreferenceFn>>) -> Arc<PreferenceFn> {
        let adapter = Arc::clone(&self.player);
        Arc::new(move |track, candidates| {
            if let Some(found) = candidates.iter().find(|c| Arc::ptr_eq(*c, &adapter)) {
                return Some(Arc::clone(found));
            }
            match &previous {
                Some(prefer) => prefer(track, candidates),
                None => candidates.first().cloned(),
            }
        })
    }

    /// Volume hook: forward the signed amount to the control utility as a
    /// `relative_volume` command targeting the current default speaker.
    fn volume_hook(&self) -> Arc<VolumeFn> {
        let transport = Arc::clone(&self.transport);
        let config = Arc::clone(&self.config);
        let spawner = self.spawner.clone();
        Arc::new(move |amount: i64| {
            let transport = Arc::clone(&transport);
            let speaker = config.read().default_speaker.clone();
            spawner.spawn(async move {
                if let Err(e) = transport
                    .dispatch(Action::RelativeVolume, &[amount.to_string()], &speaker)
                    .await
                {
                    log::warn!("[Integrate] volume change failed: {e}");
                }
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::command::{CommandResult, PlaybackProcess};
    use crate::error::CastResult;
    use crate::host::{Track, TrackSource};
    use crate::state::Config;

    struct StubPlayer {
        name: &'static str,
    }

    #[async_trait]
    impl Player for StubPlayer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn playable(&self, track: &Track) -> bool {
            track.source() == TrackSource::File
        }

        async fn start(&self, _track: &Track) -> CastResult<()> {
            Ok(())
        }

        async fn stop(&self) -> CastResult<()> {
            Ok(())
        }
    }

    struct RecordingTransport {
        calls: Mutex<Vec<(Action, Vec<String>, String)>>,
    }

    #[async_trait]
    impl ControlTransport for RecordingTransport {
        async fn dispatch(
            &self,
            action: Action,
            args: &[String],
            speaker: &str,
        ) -> CommandResult<()> {
            self.calls
                .lock()
                .push((action, args.to_vec(), speaker.to_string()));
            Ok(())
        }

        async fn launch(
            &self,
            _action: Action,
            _args: &[String],
            _speaker: &str,
        ) -> CommandResult<Box<dyn PlaybackProcess>> {
            unimplemented!("integration tests never launch a tracked process")
        }
    }

    struct Harness {
        integrator: PreferenceIntegrator,
        registry: Arc<RwLock<PlayerRegistry>>,
        adapter: Arc<dyn Player>,
        transport: Arc<RecordingTransport>,
    }

    fn harness(registry: PlayerRegistry) -> Harness {
        let registry = Arc::new(RwLock::new(registry));
        let adapter: Arc<dyn Player> = Arc::new(StubPlayer { name: "castbridge" });
        let transport = Arc::new(RecordingTransport {
            calls: Mutex::new(Vec::new()),
        });
        let config = Config {
            default_speaker: "Den".to_string(),
            ..Config::default()
        }
        .into_shared();
        let integrator = PreferenceIntegrator::new(
            Arc::clone(&registry),
            Arc::clone(&adapter),
            Arc::clone(&transport) as Arc<dyn ControlTransport>,
            config,
            TokioSpawner::current(),
        );
        Harness {
            integrator,
            registry,
            adapter,
            transport,
        }
    }

    fn other_player() -> Arc<dyn Player> {
        Arc::new(StubPlayer { name: "other" })
    }

    #[tokio::test]
    async fn enable_then_disable_restores_registry_bit_identically() {
        let prior_player = other_player();
        let prior_preference: Arc<PreferenceFn> = Arc::new(|_, candidates| candidates.last().cloned());
        let prior_volume: Arc<VolumeFn> = Arc::new(|_| {});
        let h = harness(PlayerRegistry {
            players: vec![Arc::clone(&prior_player)],
            preference: Some(Arc::clone(&prior_preference)),
            volume_change: Some(Arc::clone(&prior_volume)),
        });

        h.integrator.enable();
        assert!(h.integrator.is_enabled());
        assert_eq!(h.registry.read().players.len(), 2);

        h.integrator.disable();
        assert!(!h.integrator.is_enabled());

        let registry = h.registry.read();
        assert_eq!(registry.players.len(), 1);
        assert!(Arc::ptr_eq(&registry.players[0], &prior_player));
        assert!(Arc::ptr_eq(
            registry.preference.as_ref().unwrap(),
            &prior_preference
        ));
        assert!(Arc::ptr_eq(
            registry.volume_change.as_ref().unwrap(),
            &prior_volume
        ));
    }

    #[tokio::test]
    async fn double_enable_keeps_the_original_snapshot() {
        let prior_player = other_player();
        let h = harness(PlayerRegistry {
            players: vec![Arc::clone(&prior_player)],
            ..PlayerRegistry::default()
        });

        h.integrator.enable();
        h.integrator.enable();
        assert_eq!(h.registry.read().players.len(), 2);

        h.integrator.disable();
        let registry = h.registry.read();
        assert_eq!(registry.players.len(), 1);
        assert!(Arc::ptr_eq(&registry.players[0], &prior_player));
        assert!(registry.preference.is_none());
    }

    #[tokio::test]
    async fn disable_without_enable_is_a_no_op() {
        let h = harness(PlayerRegistry::default());
        h.integrator.disable();
        assert!(h.registry.read().players.is_empty());
    }

    #[tokio::test]
    async fn preference_picks_adapter_when_offered() {
        let h = harness(PlayerRegistry::default());
        h.integrator.enable();

        let registry = h.registry.read();
        let prefer = registry.preference.as_ref().unwrap();
        let candidates = vec![other_player(), Arc::clone(&h.adapter)];
        let chosen = prefer(&Track::file("/music/a.mp3"), &candidates).unwrap();
        assert!(Arc::ptr_eq(&chosen, &h.adapter));
    }

    #[tokio::test]
    async fn preference_delegates_to_previous_hook_when_not_offered() {
        let previous: Arc<PreferenceFn> = Arc::new(|_, candidates| candidates.last().cloned());
        let h = harness(PlayerRegistry {
            preference: Some(previous),
            ..PlayerRegistry::default()
        });
        h.integrator.enable();

        let registry = h.registry.read();
        let prefer = registry.preference.as_ref().unwrap();
        let candidates = vec![other_player(), other_player()];
        let chosen = prefer(&Track::file("/music/a.mp3"), &candidates).unwrap();
        assert!(Arc::ptr_eq(&chosen, &candidates[1]));
    }

    #[tokio::test]
    async fn preference_falls_back_to_first_candidate() {
        let h = harness(PlayerRegistry::default());
        h.integrator.enable();

        let registry = h.registry.read();
        let prefer = registry.preference.as_ref().unwrap();
        let candidates = vec![other_player(), other_player()];
        let chosen = prefer(&Track::file("/music/a.mp3"), &candidates).unwrap();
        assert!(Arc::ptr_eq(&chosen, &candidates[0]));
    }

    #[tokio::test]
    async fn volume_hook_forwards_signed_relative_volume() {
        let h = harness(PlayerRegistry::default());
        h.integrator.enable();

        h.registry.read().change_volume(-3);
        h.registry.read().change_volume(5);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let calls = h.transport.calls.lock().clone();
        assert_eq!(calls.len(), 2);
        for (action, _, speaker) in &calls {
            assert_eq!(*action, Action::RelativeVolume);
            assert_eq!(speaker, "Den");
        }
        let amounts: Vec<&str> = calls.iter().map(|(_, args, _)| args[0].as_str()).collect();
        assert!(amounts.contains(&"-3"));
        assert!(amounts.contains(&"5"));
    }
}
