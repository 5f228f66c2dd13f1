//! JSON snapshot of the shared block.

use anyhow::Result;
use herd_core::Config;

/// Attach and print a point-in-time snapshot. Observational only: never
/// contends for the main lock, so running `status` cannot steal
/// leadership from an idle block.
pub fn run(config: &Config) -> Result<()> {
    let coordinator = super::coordinator(config.clone())?;
    let snapshot = coordinator.snapshot();
    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}
