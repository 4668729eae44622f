//! Centralized error types for the Castbridge core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to machine-readable error codes for callers that report
//!   failures programmatically (CLI exit paths, host-framework surfaces)

use thiserror::Error;

use crate::command::CommandError;
use crate::discovery::DiscoveryError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for CommandError {
    fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "control_spawn_failed",
        }
    }
}

impl ErrorCode for DiscoveryError {
    fn code(&self) -> &'static str {
        match self {
            Self::Invoke { .. } => "discovery_invoke_failed",
            Self::TruncatedHeader { .. } => "discovery_truncated_header",
            Self::MalformedRow { .. } => "discovery_malformed_row",
        }
    }
}

/// Application-wide error type for the Castbridge adapter.
#[derive(Debug, Error)]
pub enum CastError {
    /// Launching or dispatching a control-utility invocation failed.
    #[error("Control command failed: {0}")]
    Command(#[from] CommandError),

    /// Speaker discovery failed (invocation or output parsing).
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// `start` was called while a playback session is already live.
    #[error("Playback already active on speaker `{0}`")]
    PlaybackActive(String),

    /// The track cannot be driven by this adapter (not a local file).
    #[error("Track is not a local file: {0}")]
    NotLocalFile(String),

    /// The player does not implement the requested optional capability.
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Adapter configuration is invalid (empty command name, etc.).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CastError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Command(e) => e.code(),
            Self::Discovery(e) => e.code(),
            Self::PlaybackActive(_) => "playback_active",
            Self::NotLocalFile(_) => "not_local_file",
            Self::Unsupported(_) => "unsupported_operation",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

// Re-export Result type aliases from their defining modules
pub use crate::command::CommandResult;
pub use crate::discovery::DiscoveryResult;

/// Convenient Result alias for adapter-wide operations.
pub type CastResult<T> = Result<T, CastError>;
