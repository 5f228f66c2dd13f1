//! Herd - process coordination over a shared-memory block
//!
//! One elected main process increments a shared counter, reports to a
//! lock-serialized journal, and keeps two one-shot worker roles running.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod cli;
pub mod commands;
