//! Types for revert command
//!
//! This module provides zero-panic, type-safe types for reverting operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use zjj_core::OutputFormat;

/// CLI arguments for revert command (parsed in main.rs)
#[derive(Debug, Clone)]
pub struct RevertArgs {
    /// Session name to revert
    pub session_name: String,

    /// Preview without executing
    pub dry_run: bool,

    /// Output format
    pub format: OutputFormat,
}

impl RevertArgs {
    /// Convert to `RevertOptions`
    pub fn to_options(&self) -> RevertOptions {
        RevertOptions {
            session_name: self.session_name.clone(),
            dry_run: self.dry_run,
            format: self.format,
        }
    }
}

/// Internal options for revert command
#[derive(Debug, Clone)]
pub struct RevertOptions {
    pub session_name: String,
    pub dry_run: bool,
    pub format: OutputFormat,
}

/// Output from revert command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevertOutput {
    pub session_name: String,
    pub dry_run: bool,
    pub commit_id: String,
    pub pushed_to_remote: bool,
    pub error: Option<String>,
}

/// Revert operation error (zero-panic, no unwraps)
#[derive(Debug, Clone)]
pub enum RevertError {
    NotInMain {
        workspace: String,
    },
    SessionNotFound {
        session_name: String,
    },
    #[allow(dead_code)]
    NoUndoHistory,
    AlreadyPushedToRemote {
        commit_id: String,
    },
    RebaseFailed {
        reason: String,
    },
    JjCommandFailed {
        command: String,
        reason: String,
    },
    ReadUndoLogFailed {
        reason: String,
    },
    WriteUndoLogFailed {
        reason: String,
    },
    SerializationError {
        reason: String,
    },
    InvalidState {
        reason: String,
    },
}

impl fmt::Display for RevertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInMain { workspace } => {
                write!(f, "Not in main branch (currently in workspace: {workspace}). Switch to main first: 'zjj focus main'")
            }
            Self::SessionNotFound { session_name } => {
                write!(f, "Session '{session_name}' not found in undo history")
            }
            Self::NoUndoHistory => write!(f, "No undo history found"),
            Self::AlreadyPushedToRemote { commit_id } => {
                write!(
                    f,
                    "Cannot revert: commit {commit_id} has already been pushed to remote"
                )
            }
            Self::RebaseFailed { reason } => write!(f, "Failed to revert merge: {reason}"),
            Self::JjCommandFailed { command, reason } => {
                write!(f, "JJ command '{command}' failed: {reason}")
            }
            Self::ReadUndoLogFailed { reason } => {
                write!(f, "Failed to read undo log: {reason}")
            }
            Self::WriteUndoLogFailed { reason } => {
                write!(f, "Failed to write undo log: {reason}")
            }
            Self::SerializationError { reason } => {
                write!(f, "Failed to serialize undo entry: {reason}")
            }
            Self::InvalidState { reason } => write!(f, "Invalid state: {reason}"),
        }
    }
}

impl std::error::Error for RevertError {}

impl RevertError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotInMain { .. } => "NOT_IN_MAIN",
            Self::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            Self::NoUndoHistory => "NO_UNDO_HISTORY",
            Self::AlreadyPushedToRemote { .. } => "ALREADY_PUSHED_TO_REMOTE",
            Self::RebaseFailed { .. } => "REBASE_FAILED",
            Self::JjCommandFailed { .. } => "JJ_COMMAND_FAILED",
            Self::ReadUndoLogFailed { .. } => "READ_UNDO_LOG_FAILED",
            Self::WriteUndoLogFailed { .. } => "WRITE_UNDO_LOG_FAILED",
            Self::SerializationError { .. } => "SERIALIZATION_ERROR",
            Self::InvalidState { .. } => "INVALID_STATE",
        }
    }
}

/// Exit codes for revert command
#[derive(Debug, Clone, Copy)]
pub enum RevertExitCode {
    Success = 0,
    AlreadyPushed = 1,
    SessionNotFound = 2,
    InvalidState = 3,
    OtherError = 4,
}
