//! One-shot worker roles.

use anyhow::{Context, Result};
use herd_core::{Config, Role};

/// Run a single worker role to completion.
///
/// Any failure here exits the process non-zero: a worker has no further
/// scheduled work to protect, unlike main's contained periodic actions.
pub fn run(role: Role, config: Config) -> Result<()> {
    let coordinator = super::coordinator(config)?;
    match role {
        Role::A => coordinator.run_role_a(),
        Role::B => coordinator.run_role_b(),
    }
    .with_context(|| format!("{role} failed"))
}
