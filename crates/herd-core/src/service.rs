//! Coordinator: leader election, periodic maintenance, worker roles.
//!
//! Every process builds one of these around the shared block. Whoever
//! holds the main lock drives the periodic actions; the two worker roles
//! are one-shot entry points run by subprocesses main spawns. The "am I
//! main?" question is re-asked before every action rather than answered
//! once at startup, so each action's precondition stays explicit and a
//! future leadership hand-off would not need restructuring.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::journal::Journal;
use crate::lock::{LockOwner, Pid};
use crate::probe::{ProcessProbe, ProcessSpawner, Role};
use crate::shm::SharedBlock;
use crate::state::SharedState;

/// Per-role counter deltas.
const INCREMENT_DELTA: i64 = 1;
const ROLE_A_BONUS: i64 = 10;

/// One process's view of the shared coordination state.
pub struct Coordinator {
    config: Config,
    block: Arc<SharedBlock>,
    journal: Journal,
    probe: Arc<dyn ProcessProbe>,
    spawner: Arc<dyn ProcessSpawner>,
    self_pid: Pid,
}

impl Coordinator {
    /// Coordinator acting as the calling process.
    pub fn new(
        config: Config,
        block: Arc<SharedBlock>,
        probe: Arc<dyn ProcessProbe>,
        spawner: Arc<dyn ProcessSpawner>,
    ) -> Self {
        let pid = std::process::id();
        Self::with_identity(config, block, probe, spawner, pid)
    }

    /// Coordinator acting under an explicit identity.
    ///
    /// Lets one test process stand in for several cooperating processes
    /// against the same block.
    pub fn with_identity(
        config: Config,
        block: Arc<SharedBlock>,
        probe: Arc<dyn ProcessProbe>,
        spawner: Arc<dyn ProcessSpawner>,
        self_pid: Pid,
    ) -> Self {
        let journal = Journal::new(config.journal_path.clone());
        Self {
            config,
            block,
            journal,
            probe,
            spawner,
            self_pid,
        }
    }

    pub fn pid(&self) -> Pid {
        self.self_pid
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn state(&self) -> &SharedState {
        self.block.state()
    }

    /// Whether this process is the elected main.
    ///
    /// The first caller against a free (or dead-owner) lock wins and keeps
    /// winning: `try_acquire` is idempotent for the holder, so main polls
    /// this before every periodic action.
    pub fn is_main(&self) -> bool {
        self.state()
            .main_lock()
            .try_acquire(self.self_pid, self.probe.as_ref())
    }

    /// Store an externally supplied counter value.
    pub fn set_value(&self, value: i64) {
        self.state().set_counter(value);
    }

    /// Periodic: unconditional counter increment. Every attached service
    /// process contributes, elected or not.
    pub fn increment(&self) {
        self.state().add(INCREMENT_DELTA);
    }

    /// Periodic: main reports its pid and the counter to the journal.
    pub fn report(&self) -> Result<()> {
        if !self.is_main() {
            return Ok(());
        }
        let counter = self.state().counter();
        self.log(&format!("pid={} counter={counter}", self.self_pid))
    }

    /// Periodic: main spawns one subprocess per worker role, but only when
    /// neither recorded worker pid resolves to a live process.
    ///
    /// The pid slots are never cleared on worker exit, so liveness is the
    /// gate: a finished worker generation does not block the next spawn
    /// cycle, a running one does. A spawn failure propagates to the
    /// scheduler, which logs it and retries on the next cycle.
    pub fn spawn_workers(&self) -> Result<()> {
        if !self.is_main() {
            return Ok(());
        }

        let state = self.state();
        if self.probe.is_alive(state.worker_pid(Role::A))
            || self.probe.is_alive(state.worker_pid(Role::B))
        {
            return Ok(());
        }

        for role in [Role::A, Role::B] {
            let pid = self.spawner.spawn_role(role)?;
            state.record_worker(role, pid);
            tracing::info!(%role, pid, "spawned worker");
        }
        Ok(())
    }

    /// One-shot role A: a bonus increment, bracketed by journal lines.
    pub fn run_role_a(&self) -> Result<()> {
        self.log(&format!("pid={} role-a started", self.self_pid))?;
        self.state().add(ROLE_A_BONUS);
        self.log(&format!("pid={} role-a finished", self.self_pid))
    }

    /// One-shot role B: double the counter, hold, halve it.
    ///
    /// The hold is a deliberate blocking sleep, the only wall-clock
    /// suspension in the system. Increments landing between the two spins
    /// survive (halved); the final value is deliberately not guaranteed
    /// to equal the original.
    pub fn run_role_b(&self) -> Result<()> {
        self.log(&format!("pid={} role-b started", self.self_pid))?;
        self.state().double();
        std::thread::sleep(self.config.worker_hold());
        self.state().halve();
        self.log(&format!("pid={} role-b finished", self.self_pid))
    }

    /// Graceful exit: give up main if this process holds it (or would win
    /// it uncontested). A killed main is instead reclaimed by the next
    /// contender's liveness check.
    pub fn shutdown(&self) {
        let lock = self.state().main_lock();
        if lock.try_acquire(self.self_pid, self.probe.as_ref()) {
            lock.release(self.self_pid);
        }
    }

    /// Journal a line for this process, serialized by the logging lock.
    pub fn log(&self, message: &str) -> Result<()> {
        self.journal.append(
            self.state().logging_lock(),
            self.self_pid,
            self.probe.as_ref(),
            message,
        )
    }

    /// Point-in-time view of the shared block. Purely observational: does
    /// not contend for any lock.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state();
        let slot = |role| {
            let pid = state.worker_pid(role);
            WorkerSlot {
                pid,
                alive: self.probe.is_alive(pid),
            }
        };
        Snapshot {
            pid: self.self_pid,
            counter: state.counter(),
            main_owner: owner_pid(state.main_lock().owner()),
            logging_owner: owner_pid(state.logging_lock().owner()),
            worker_a: slot(Role::A),
            worker_b: slot(Role::B),
        }
    }
}

fn owner_pid(owner: LockOwner) -> Option<Pid> {
    match owner {
        LockOwner::Free => None,
        LockOwner::HeldBy(pid) => Some(pid),
    }
}

/// Snapshot of the shared block for the `status` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Pid of the observing process.
    pub pid: Pid,
    pub counter: i64,
    /// Recorded main-lock holder, if any; may be a dead process awaiting
    /// reclamation.
    pub main_owner: Option<Pid>,
    pub logging_owner: Option<Pid>,
    pub worker_a: WorkerSlot,
    pub worker_b: WorkerSlot,
}

/// A worker pid slot plus what the liveness probe says about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSlot {
    pub pid: Pid,
    pub alive: bool,
}
