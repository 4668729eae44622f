//! Speaker discovery via the external discovery utility.
//!
//! The discovery utility prints a tabular report: a fixed-size header,
//! then one row per reachable speaker, fields separated by runs of two or
//! more spaces, first field the speaker identifier. [`SpeakerDirectory`]
//! shells out to the utility, parses that report, and caches the resulting
//! identifier list with the [`ALL_SPEAKERS`] sentinel prepended.
//!
//! Unlike the control path, discovery is a synchronous, blocking call. It is
//! a user-initiated, bounded-latency operation and must never be invoked
//! from a hot control path.

use std::sync::OnceLock;

use parking_lot::RwLock;
use regex::Regex;
use thiserror::Error;

use crate::state::{SharedConfig, ALL_SPEAKERS};

/// Number of leading report lines discarded before the data rows.
pub const HEADER_LINES: usize = 5;

/// Errors from running or parsing a discovery report.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The discovery command could not be run through the shell.
    #[error("failed to run discovery command `{command}`: {source}")]
    Invoke {
        /// The command line that failed.
        command: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The report is shorter than the fixed header, so no data section exists.
    #[error("discovery output too short: expected a {HEADER_LINES}-line header, got {lines} line(s)")]
    TruncatedHeader {
        /// Number of lines actually present.
        lines: usize,
    },

    /// A data row did not split into an identifier and a description.
    #[error("malformed discovery row at line {line}: {content:?}")]
    MalformedRow {
        /// 1-based line number in the report.
        line: usize,
        /// The offending row text.
        content: String,
    },
}

/// Convenient Result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

fn field_separator() -> &'static Regex {
    static FIELD_SEPARATOR: OnceLock<Regex> = OnceLock::new();
    FIELD_SEPARATOR.get_or_init(|| Regex::new(r" {2,}").expect("static regex"))
}

/// Parses a discovery report into speaker identifiers.
///
/// The first [`HEADER_LINES`] lines are discarded; the contiguous run of
/// non-empty lines that follows (up to the first blank line or end of input)
/// forms the data section. Each row must split on runs of two-or-more spaces
/// into at least an identifier and a description.
///
/// The returned list always starts with the [`ALL_SPEAKERS`] sentinel.
///
/// # Errors
///
/// Fails with a descriptive error when the header is shorter than
/// [`HEADER_LINES`] or a data row does not have the expected shape. Malformed
/// reports never degrade silently into an empty list.
pub fn parse_speaker_table(output: &str) -> DiscoveryResult<Vec<String>> {
    let lines: Vec<&str> = output.lines().collect();
    if lines.len() < HEADER_LINES {
        return Err(DiscoveryError::TruncatedHeader { lines: lines.len() });
    }

    let mut speakers = vec![ALL_SPEAKERS.to_string()];
    for (index, line) in lines[HEADER_LINES..].iter().enumerate() {
        if line.trim().is_empty() {
            break;
        }
        let fields: Vec<&str> = field_separator()
            .split(line.trim())
            .filter(|field| !field.is_empty())
            .collect();
        if fields.len() < 2 {
            return Err(DiscoveryError::MalformedRow {
                line: HEADER_LINES + index + 1,
                content: (*line).to_string(),
            });
        }
        speakers.push(fields[0].to_string());
    }
    Ok(speakers)
}

/// Source of raw discovery report text.
///
/// Decouples [`SpeakerDirectory`] from the shell so parsing and caching are
/// testable without a real discovery utility on `PATH`.
pub trait DiscoverySource: Send + Sync {
    /// Produces one full discovery report.
    fn capture(&self) -> DiscoveryResult<String>;
}

/// Runs the configured discovery command through the shell.
///
/// Invoked as `sh -c "<discover_command> <discover_args...> 2>&1"` so the
/// captured text matches what the utility prints to a terminal.
pub struct ShellDiscovery {
    config: SharedConfig,
}

impl ShellDiscovery {
    /// Creates a shell-backed source reading the given configuration.
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

impl DiscoverySource for ShellDiscovery {
    fn capture(&self) -> DiscoveryResult<String> {
        let command_line = {
            let config = self.config.read();
            let mut parts = vec![config.discover_command.clone()];
            parts.extend(config.discover_args.iter().cloned());
            format!("{} 2>&1", parts.join(" "))
        };
        log::debug!("[Discovery] sh -c {command_line:?}");
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(&command_line)
            .output()
            .map_err(|source| DiscoveryError::Invoke {
                command: command_line,
                source,
            })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Cached directory of discoverable speaker targets.
pub struct SpeakerDirectory {
    source: Box<dyn DiscoverySource>,
    cache: RwLock<Option<Vec<String>>>,
}

impl SpeakerDirectory {
    /// Creates a directory over an arbitrary report source.
    pub fn new(source: Box<dyn DiscoverySource>) -> Self {
        Self {
            source,
            cache: RwLock::new(None),
        }
    }

    /// Creates a directory backed by the configured discovery command.
    pub fn with_config(config: SharedConfig) -> Self {
        Self::new(Box::new(ShellDiscovery::new(config)))
    }

    /// Forces a re-query of the discovery utility and replaces the cache.
    ///
    /// Blocking; see the module docs. On error the previous cache is left
    /// unchanged.
    pub fn refresh(&self) -> DiscoveryResult<Vec<String>> {
        let report = self.source.capture()?;
        let speakers = parse_speaker_table(&report)?;
        log::info!("[Discovery] {} speaker(s) discovered", speakers.len() - 1);
        *self.cache.write() = Some(speakers.clone());
        Ok(speakers)
    }

    /// Returns the cached list, refreshing only if nothing is cached yet.
    pub fn speakers(&self) -> DiscoveryResult<Vec<String>> {
        if let Some(cached) = self.cache.read().as_ref() {
            return Ok(cached.clone());
        }
        self.refresh()
    }

    /// Returns the current cache without triggering discovery.
    pub fn cached(&self) -> Option<Vec<String>> {
        self.cache.read().clone()
    }
}
