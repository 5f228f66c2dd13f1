//! Process collaborators: liveness probing and worker spawning.
//!
//! Both are traits so the coordinator can be exercised in-process with
//! stub implementations standing in for the OS.

use std::fmt;
use std::process::{Child, Command};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::lock::Pid;

/// Worker role selected by a command-line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// One-shot bonus increment.
    A,
    /// One-shot double/hold/halve.
    B,
}

impl Role {
    /// Flag passed to the subprocess to select this role.
    pub const fn flag(self) -> &'static str {
        match self {
            Self::A => "--role-a",
            Self::B => "--role-b",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => write!(f, "role-a"),
            Self::B => write!(f, "role-b"),
        }
    }
}

/// Answers "does this pid name a live process right now?".
///
/// The answer is a snapshot, not a held guarantee: the process may exit
/// the instant after the call returns. Implementations must return false
/// for pid 0 and must not block.
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: Pid) -> bool;
}

/// Launches one worker subprocess per role.
pub trait ProcessSpawner: Send + Sync {
    /// Start the worker and return immediately with its pid.
    fn spawn_role(&self, role: Role) -> Result<Pid>;
}

/// The real OS implementation of both collaborators.
///
/// Liveness is the `/proc/<pid>` existence check on unix. A process that
/// exists but cannot be signalled by this user still counts as alive:
/// reclaiming a lock from a running owner is strictly worse than waiting
/// out a dead one.
#[derive(Debug, Default)]
pub struct SystemProcesses {
    // Children we spawned, reaped opportunistically so an exited worker
    // does not linger as a zombie and fool the /proc check.
    children: Mutex<Vec<Child>>,
}

impl SystemProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    fn reap(&self) {
        if let Ok(mut children) = self.children.lock() {
            children.retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        }
    }
}

impl ProcessProbe for SystemProcesses {
    fn is_alive(&self, pid: Pid) -> bool {
        if pid == 0 {
            return false;
        }
        self.reap();
        pid_exists(pid)
    }
}

impl ProcessSpawner for SystemProcesses {
    fn spawn_role(&self, role: Role) -> Result<Pid> {
        let exe = std::env::current_exe().map_err(|source| Error::Spawn { role, source })?;
        let child = Command::new(exe)
            .arg(role.flag())
            .spawn()
            .map_err(|source| Error::Spawn { role, source })?;
        let pid = child.id();
        if let Ok(mut children) = self.children.lock() {
            children.push(child);
        }
        Ok(pid)
    }
}

#[cfg(unix)]
fn pid_exists(pid: Pid) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}

#[cfg(not(unix))]
fn pid_exists(_pid: Pid) -> bool {
    // No cheap non-blocking check here; report alive and rely on holders
    // releasing gracefully.
    true
}

#[cfg(test)]
pub(crate) mod stubs {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::{ProcessProbe, ProcessSpawner, Role};
    use crate::error::Result;
    use crate::lock::Pid;

    /// In-memory stand-in for the OS: a set of live pids plus a spawn log.
    /// Spawned pids are allocated sequentially and marked alive.
    #[derive(Debug)]
    pub(crate) struct FakeProcesses {
        alive: Mutex<HashSet<Pid>>,
        spawned: Mutex<Vec<(Role, Pid)>>,
        next_pid: AtomicU32,
    }

    impl FakeProcesses {
        pub(crate) fn new() -> Self {
            Self {
                alive: Mutex::new(HashSet::new()),
                spawned: Mutex::new(Vec::new()),
                next_pid: AtomicU32::new(500),
            }
        }

        pub(crate) fn set_alive(&self, pid: Pid, alive: bool) {
            let mut set = self.alive.lock().unwrap();
            if alive {
                set.insert(pid);
            } else {
                set.remove(&pid);
            }
        }

        pub(crate) fn spawned(&self) -> Vec<(Role, Pid)> {
            self.spawned.lock().unwrap().clone()
        }

        pub(crate) fn spawn_count(&self) -> usize {
            self.spawned.lock().unwrap().len()
        }
    }

    impl ProcessProbe for FakeProcesses {
        fn is_alive(&self, pid: Pid) -> bool {
            pid != 0 && self.alive.lock().unwrap().contains(&pid)
        }
    }

    impl ProcessSpawner for FakeProcesses {
        fn spawn_role(&self, role: Role) -> Result<Pid> {
            let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
            self.set_alive(pid, true);
            self.spawned.lock().unwrap().push((role, pid));
            Ok(pid)
        }
    }
}
