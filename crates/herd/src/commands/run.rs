//! The default attach-and-schedule path.
//!
//! Attaches to the shared block, starts the three periodic actions, and
//! then feeds externally supplied counter values from stdin until EOF or
//! ctrl-c. The periodic actions are independent of each other; each one
//! re-checks "am I main?" on its own.

use std::sync::Arc;

use anyhow::Result;
use herd_core::{Coordinator, PeriodicTask};
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config: herd_core::Config) -> Result<()> {
    let coordinator = Arc::new(super::coordinator(config)?);
    coordinator.log(&format!("pid={} started", coordinator.pid()))?;
    tracing::info!(pid = coordinator.pid(), "attached to shared block");

    let tasks = start_periodic(&coordinator);
    for task in &tasks {
        tracing::debug!(task = task.name(), "scheduled");
    }

    consume_stdin(&coordinator).await?;

    drop(tasks);
    coordinator.shutdown();
    tracing::info!("shut down");
    Ok(())
}

fn start_periodic(coordinator: &Arc<Coordinator>) -> Vec<PeriodicTask> {
    let increment = {
        let c = Arc::clone(coordinator);
        PeriodicTask::spawn("increment", c.config().increment_interval(), move || {
            let c = Arc::clone(&c);
            async move {
                c.increment();
                Ok(())
            }
        })
    };
    let report = {
        let c = Arc::clone(coordinator);
        PeriodicTask::spawn("report", c.config().report_interval(), move || {
            let c = Arc::clone(&c);
            async move { c.report() }
        })
    };
    let spawn = {
        let c = Arc::clone(coordinator);
        PeriodicTask::spawn("spawn-workers", c.config().spawn_interval(), move || {
            let c = Arc::clone(&c);
            async move { c.spawn_workers() }
        })
    };
    vec![increment, report, spawn]
}

/// Read counter values from stdin until interrupted.
///
/// Non-integer lines are logged and skipped. After EOF the service keeps
/// running on its schedules until ctrl-c.
async fn consume_stdin(coordinator: &Coordinator) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            line = lines.next_line() => match line {
                Ok(Some(text)) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match text.parse::<i64>() {
                        Ok(value) => {
                            coordinator.set_value(value);
                            tracing::info!(value, "counter set");
                        }
                        Err(_) => tracing::warn!(input = text, "ignoring non-integer input"),
                    }
                }
                Ok(None) => {
                    tokio::signal::ctrl_c().await?;
                    return Ok(());
                }
                Err(error) => {
                    tracing::warn!(%error, "stdin read failed");
                    tokio::signal::ctrl_c().await?;
                    return Ok(());
                }
            }
        }
    }
}
