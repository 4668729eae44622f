//! Interactive default-speaker selection.
//!
//! The prompting surface itself is pluggable: anything that can ask the user
//! to pick from a list implements [`SpeakerPrompt`]. The selection flow
//! enforces the exact-match requirement and re-prompts on unknown input
//! instead of silently accepting a speaker the directory never reported.

use crate::discovery::SpeakerDirectory;
use crate::error::CastResult;
use crate::state::SharedConfig;

/// Capability to ask the user to pick one entry from a list.
pub trait SpeakerPrompt {
    /// Presents the choices and returns the user's input, or `None` when
    /// the user aborts (EOF, cancel).
    fn pick(&self, speakers: &[String]) -> Option<String>;
}

/// Prompts for a speaker from the directory's list and updates the default.
///
/// Uses the cached list, refreshing only if nothing is cached yet. Input
/// must exactly match one of the listed identifiers; anything else is
/// rejected and the prompt is repeated. Returns the chosen speaker, or
/// `None` when the user aborts without changing the configuration.
///
/// # Errors
///
/// Propagates discovery failures from the initial list retrieval.
pub fn select_speaker(
    directory: &SpeakerDirectory,
    config: &SharedConfig,
    prompt: &dyn SpeakerPrompt,
) -> CastResult<Option<String>> {
    let speakers = directory.speakers()?;
    loop {
        let Some(choice) = prompt.pick(&speakers) else {
            return Ok(None);
        };
        if speakers.contains(&choice) {
            config.write().default_speaker = choice.clone();
            log::info!("[Select] default speaker set to `{choice}`");
            return Ok(Some(choice));
        }
        log::warn!("[Select] `{choice}` is not a discovered speaker; asking again");
    }
}
