//! Herd-core - Shared-memory process coordination
//!
//! This crate provides:
//! - A named shared-memory block holding the coordination state
//! - A process lock with dead-owner reclamation
//! - The coordinator service: leader election, periodic maintenance,
//!   and the two one-shot worker roles
//! - Process liveness/spawning collaborators, injectable for tests

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod journal;
pub mod lock;
pub mod periodic;
pub mod probe;
pub mod service;
pub mod shm;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use journal::Journal;
pub use lock::{LockOwner, Pid, ProcessLock};
pub use periodic::PeriodicTask;
pub use probe::{ProcessProbe, ProcessSpawner, Role, SystemProcesses};
pub use service::{Coordinator, Snapshot, WorkerSlot};
pub use shm::SharedBlock;
pub use state::SharedState;
