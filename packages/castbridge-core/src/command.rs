//! Control-utility invocation.
//!
//! Every transport action ends up here: [`CommandRunner`] builds the full
//! argument vector `shared_args ++ [speaker] ++ [action] ++ args` and spawns
//! the control utility as a non-blocking external process. The
//! [`ControlTransport`] trait decouples callers from the real spawner so the
//! playback and integration layers can be tested against a recording mock.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::SharedConfig;

/// Transport actions understood by the control utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Start playing a local file on the target speaker.
    PlayFile,
    /// Halt playback on the target speaker.
    Stop,
    /// Pause the current stream.
    Pause,
    /// Resume a paused stream.
    Play,
    /// Skip forward by a number of seconds.
    SeekForward,
    /// Skip backward by a number of seconds.
    SeekBack,
    /// Jump to an absolute position in seconds.
    Seek,
    /// Adjust volume by a signed amount.
    RelativeVolume,
}

impl Action {
    /// The action token as the control utility expects it on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlayFile => "play_file",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Play => "play",
            Self::SeekForward => "seek_forward",
            Self::SeekBack => "seek_back",
            Self::Seek => "seek",
            Self::RelativeVolume => "relative_volume",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from launching the control utility.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The executable could not be spawned (missing binary, permissions).
    ///
    /// This is a configuration error: it is surfaced to the caller of the
    /// affected operation and never retried.
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        /// The executable that failed to start.
        command: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Convenient Result alias for control invocations.
pub type CommandResult<T> = Result<T, CommandError>;

/// Handle to a launched playback process.
///
/// Owned by the playback monitor task; supports observing termination and
/// forcing a kill. Dropping the handle does not kill the process.
#[async_trait]
pub trait PlaybackProcess: Send {
    /// Waits until the process exits, for any reason.
    async fn wait(&mut self);

    /// Forcibly terminates the process. Errors are ignored; the process may
    /// already have exited.
    async fn kill(&mut self);

    /// OS process id, if the process is still believed to be running.
    fn id(&self) -> Option<u32>;
}

/// Trait for issuing control-utility invocations.
///
/// `dispatch` is fire-and-forget: the call returns once the process has been
/// launched, without waiting for the speaker to acknowledge. `launch` returns
/// a handle for the one tracked playback process.
#[async_trait]
pub trait ControlTransport: Send + Sync {
    /// Spawns a control invocation and returns immediately.
    async fn dispatch(&self, action: Action, args: &[String], speaker: &str) -> CommandResult<()>;

    /// Spawns a control invocation and returns a process handle.
    async fn launch(
        &self,
        action: Action,
        args: &[String],
        speaker: &str,
    ) -> CommandResult<Box<dyn PlaybackProcess>>;
}

/// Builds and launches control-utility invocations.
///
/// Holds no state across calls except the shared configuration it reads at
/// each invocation. Each call spawns one OS-level process.
pub struct CommandRunner {
    config: SharedConfig,
}

impl CommandRunner {
    /// Creates a runner reading the given configuration.
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Creates a runner wrapped in the `Arc` most call sites want.
    pub fn arc(config: SharedConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    /// Whether the control executable resolves on `PATH`.
    ///
    /// Used by the `playable` gate so an unconfigured system is skipped by
    /// the host's player selection instead of failing at start time.
    pub fn is_resolvable(&self) -> bool {
        which::which(&self.config.read().command).is_ok()
    }

    /// Builds the full argument vector for one invocation:
    /// `shared_args ++ [speaker] ++ [action] ++ args`.
    fn build_args(
        shared_args: &[String],
        action: Action,
        args: &[String],
        speaker: &str,
    ) -> Vec<String> {
        let mut argv = Vec::with_capacity(shared_args.len() + 2 + args.len());
        argv.extend(shared_args.iter().cloned());
        argv.push(speaker.to_string());
        argv.push(action.as_str().to_string());
        argv.extend(args.iter().cloned());
        argv
    }

    fn spawn(
        &self,
        action: Action,
        args: &[String],
        speaker: &str,
    ) -> CommandResult<tokio::process::Child> {
        let (command, argv) = {
            let config = self.config.read();
            (
                config.command.clone(),
                Self::build_args(&config.shared_args, action, args, speaker),
            )
        };
        log::debug!("[Command] {} {}", command, argv.join(" "));
        tokio::process::Command::new(&command)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| CommandError::Spawn { command, source })
    }
}

#[async_trait]
impl ControlTransport for CommandRunner {
    async fn dispatch(&self, action: Action, args: &[String], speaker: &str) -> CommandResult<()> {
        // Fire-and-forget: the child is dropped and reaped by the runtime.
        self.spawn(action, args, speaker)?;
        Ok(())
    }

    async fn launch(
        &self,
        action: Action,
        args: &[String],
        speaker: &str,
    ) -> CommandResult<Box<dyn PlaybackProcess>> {
        let child = self.spawn(action, args, speaker)?;
        Ok(Box::new(ChildProcess { child }))
    }
}

/// [`PlaybackProcess`] over a real [`tokio::process::Child`].
struct ChildProcess {
    child: tokio::process::Child,
}

#[async_trait]
impl PlaybackProcess for ChildProcess {
    async fn wait(&mut self) {
        let _ = self.child.wait().await;
    }

    async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }

    fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

/// Renders a signed offset as the unsigned magnitude the control utility
/// expects: base-10 absolute value, no sign, no leading zeros.
pub fn render_magnitude(value: i64) -> String {
    value.unsigned_abs().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Config, ALL_SPEAKERS};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn action_tokens_match_wire_format() {
        assert_eq!(Action::PlayFile.as_str(), "play_file");
        assert_eq!(Action::Stop.as_str(), "stop");
        assert_eq!(Action::Pause.as_str(), "pause");
        assert_eq!(Action::Play.as_str(), "play");
        assert_eq!(Action::SeekForward.as_str(), "seek_forward");
        assert_eq!(Action::SeekBack.as_str(), "seek_back");
        assert_eq!(Action::Seek.as_str(), "seek");
        assert_eq!(Action::RelativeVolume.as_str(), "relative_volume");
    }

    #[test]
    fn argv_shape_is_shared_speaker_action_args() {
        let argv = CommandRunner::build_args(
            &args(&["--timeout", "5"]),
            Action::PlayFile,
            &args(&["/music/a.mp3"]),
            "Kitchen",
        );
        assert_eq!(
            argv,
            args(&["--timeout", "5", "Kitchen", "play_file", "/music/a.mp3"])
        );
    }

    #[test]
    fn argv_speaker_is_one_token_even_for_sentinel() {
        let argv = CommandRunner::build_args(&[], Action::Stop, &[], ALL_SPEAKERS);
        assert_eq!(argv, args(&["_all_", "stop"]));
    }

    #[test]
    fn magnitude_renders_unsigned_without_leading_zeros() {
        assert_eq!(render_magnitude(30), "30");
        assert_eq!(render_magnitude(-30), "30");
        assert_eq!(render_magnitude(0), "0");
        assert_eq!(render_magnitude(i64::MIN), "9223372036854775808");
    }

    #[tokio::test]
    async fn spawn_unknown_executable_is_a_loud_error() {
        let config = Config {
            command: "castbridge_nonexistent_command_xyz".to_string(),
            ..Config::default()
        }
        .into_shared();
        let runner = CommandRunner::new(config);
        let err = runner
            .dispatch(Action::Pause, &[], ALL_SPEAKERS)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_wait_observes_exit() {
        // `sh -c exit` ignores the trailing speaker/action tokens, which land
        // in the shell's positional parameters.
        let config = Config {
            command: "sh".to_string(),
            shared_args: args(&["-c", "exit 0", "--"]),
            ..Config::default()
        }
        .into_shared();
        let runner = CommandRunner::new(config);
        let mut process = runner
            .launch(Action::PlayFile, &args(&["/music/a.mp3"]), "Kitchen")
            .await
            .unwrap();
        process.wait().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_kill_terminates_long_runner() {
        let config = Config {
            command: "sh".to_string(),
            shared_args: args(&["-c", "sleep 60", "--"]),
            ..Config::default()
        }
        .into_shared();
        let runner = CommandRunner::new(config);
        let mut process = runner
            .launch(Action::PlayFile, &args(&["/music/a.mp3"]), "Kitchen")
            .await
            .unwrap();
        assert!(process.id().is_some());
        process.kill().await;
        process.wait().await;
    }

    #[cfg(unix)]
    #[test]
    fn resolvable_reflects_path_lookup() {
        let present = Config {
            command: "sh".to_string(),
            ..Config::default()
        }
        .into_shared();
        assert!(CommandRunner::new(present).is_resolvable());

        let missing = Config {
            command: "castbridge_nonexistent_command_xyz".to_string(),
            ..Config::default()
        }
        .into_shared();
        assert!(!CommandRunner::new(missing).is_resolvable());
    }
}
