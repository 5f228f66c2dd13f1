//! Workspace Lifecycle State Machine
//!
//! Provides a type-safe state machine for workspace lifecycle management:
//! - `WorkspaceState` enum for runtime state representation
//! - Valid state transitions with exhaustive pattern matching
//! - Atomic state transition support for concurrent agents
//! - Railway-Oriented error handling with zero panics
//!
//! # State Machine
//!
//! ```text
//! Created -> Working        (start work)
//! Working -> Ready          (work complete)
//! Working -> Conflict       (merge conflict detected)
//! Working -> Abandoned      (manual abandon)
//! Ready -> Working          (needs more work)
//! Ready -> Merged           (successful merge)
//! Ready -> Conflict         (merge conflict on merge attempt)
//! Ready -> Abandoned        (decided not to merge)
//! Conflict -> Working       (conflict resolved)
//! Conflict -> Abandoned     (give up on conflict)
//! ```
//!
//! Terminal states: `Merged`, `Abandoned`

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════
// WORKSPACE STATE ENUM
// ═══════════════════════════════════════════════════════════════════════════

/// Workspace lifecycle states for parallel agent coordination
///
/// This enum represents the lifecycle of a workspace from creation to
/// final merge or abandonment. It supports 40+ concurrent agents with
/// atomic state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceState {
    /// Workspace created, not yet actively worked on
    #[default]
    Created,
    /// Actively being worked on by an agent
    Working,
    /// Work complete, ready for merge review
    Ready,
    /// Successfully merged to main branch
    Merged,
    /// Manually abandoned by agent
    Abandoned,
    /// Merge conflict detected, needs resolution
    Conflict,
}

impl WorkspaceState {
    /// Returns all valid next states from current state.
    ///
    /// Uses exhaustive pattern matching to ensure all states are covered.
    /// This is the single source of truth for valid transitions.
    #[must_use]
    pub fn valid_next_states(self) -> Vec<Self> {
        match self {
            Self::Created => vec![Self::Working],
            Self::Working => vec![Self::Ready, Self::Conflict, Self::Abandoned],
            Self::Ready => vec![Self::Working, Self::Merged, Self::Conflict, Self::Abandoned],
            Self::Conflict => vec![Self::Working, Self::Abandoned],
            // Terminal states - no transitions out
            Self::Merged | Self::Abandoned => vec![],
        }
    }

    /// Returns true if this state can transition to the next state.
    ///
    /// Uses exhaustive matching via `valid_next_states()`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.valid_next_states().contains(&next)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Merged | Self::Abandoned)
    }

    /// Returns true if this state indicates active work is happening.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Working | Self::Conflict)
    }

    /// Returns true if this state indicates work is complete (ready or merged).
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Ready | Self::Merged)
    }

    /// Returns all possible workspace states as a slice.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Created,
            Self::Working,
            Self::Ready,
            Self::Merged,
            Self::Abandoned,
            Self::Conflict,
        ]
    }
}

impl fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Working => write!(f, "working"),
            Self::Ready => write!(f, "ready"),
            Self::Merged => write!(f, "merged"),
            Self::Abandoned => write!(f, "abandoned"),
            Self::Conflict => write!(f, "conflict"),
        }
    }
}

impl FromStr for WorkspaceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "created" => Ok(Self::Created),
            "working" => Ok(Self::Working),
            "ready" => Ok(Self::Ready),
            "merged" => Ok(Self::Merged),
            "abandoned" => Ok(Self::Abandoned),
            "conflict" => Ok(Self::Conflict),
            _ => Err(Error::ValidationError(format!(
                "Invalid workspace state: '{s}'. Valid states: created, working, ready, merged, abandoned, conflict"
            ))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STATE TRANSITION
// ═══════════════════════════════════════════════════════════════════════════

/// A workspace state transition event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceStateTransition {
    /// Source state
    pub from: WorkspaceState,
    /// Target state
    pub to: WorkspaceState,
    /// Timestamp of transition (UTC)
    pub timestamp: DateTime<Utc>,
    /// Reason for transition (human-readable)
    pub reason: String,
    /// Agent ID that performed the transition (for audit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl WorkspaceStateTransition {
    /// Create a new state transition
    #[must_use]
    pub fn new(from: WorkspaceState, to: WorkspaceState, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            timestamp: Utc::now(),
            reason: reason.into(),
            agent_id: None,
        }
    }

    /// Create a new state transition with agent ID
    #[must_use]
    pub fn with_agent(
        from: WorkspaceState,
        to: WorkspaceState,
        reason: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            from,
            to,
            timestamp: Utc::now(),
            reason: reason.into(),
            agent_id: Some(agent_id.into()),
        }
    }

    /// Validate that the transition is allowed
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` if the transition is not allowed.
    pub fn validate(&self) -> Result<()> {
        if self.from.can_transition_to(self.to) {
            Ok(())
        } else {
            Err(Error::ValidationError(format!(
                "Invalid workspace state transition: {} -> {}. Valid transitions from {} are: {:?}",
                self.from,
                self.to,
                self.from,
                self.from.valid_next_states()
            )))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STATE QUERY HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Filter predicate for workspace states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceStateFilter {
    /// Match a specific state
    State(WorkspaceState),
    /// Match any active state (Working, Conflict)
    Active,
    /// Match any complete state (Ready, Merged)
    Complete,
    /// Match any terminal state (Merged, Abandoned)
    Terminal,
    /// Match any non-terminal state
    NonTerminal,
    /// Match all states
    All,
}

impl WorkspaceStateFilter {
    /// Check if a workspace state matches this filter
    #[must_use]
    pub fn matches(self, state: WorkspaceState) -> bool {
        match self {
            Self::State(s) => state == s,
            Self::Active => state.is_active(),
            Self::Complete => state.is_complete(),
            Self::Terminal => state.is_terminal(),
            Self::NonTerminal => !state.is_terminal(),
            Self::All => true,
        }
    }
}

impl FromStr for WorkspaceStateFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "complete" => Ok(Self::Complete),
            "terminal" => Ok(Self::Terminal),
            "non-terminal" | "nonterminal" => Ok(Self::NonTerminal),
            _ => {
                // Try parsing as a specific state
                WorkspaceState::from_str(s).map(Self::State)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
