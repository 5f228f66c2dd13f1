//! Command implementations for the herd CLI.

pub mod role;
pub mod run;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use herd_core::{Config, Coordinator, ProcessProbe, SharedBlock, SystemProcesses};

/// Attach to (or create) the shared block and build a coordinator backed
/// by the real OS collaborators.
fn coordinator(config: Config) -> Result<Coordinator> {
    let block = Arc::new(
        SharedBlock::open_or_create(&config.block_name)
            .context("attaching to the shared block")?,
    );
    let system = Arc::new(SystemProcesses::new());
    let probe: Arc<dyn ProcessProbe> = system.clone();
    Ok(Coordinator::new(config, block, probe, system))
}
