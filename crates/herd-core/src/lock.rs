//! Shared-memory process lock with dead-owner reclamation.
//!
//! Ownership is a process id stored in a single atomic cell inside the
//! shared block: `0` means free, any other value is the pid of the holder.
//! Unlike a thread mutex, the holder can die without running any release
//! code, so contenders probe the owner's liveness and reclaim the cell by
//! compare-and-swap from the exact stale value they observed. The swap is
//! the correctness guard against the owner dying (or releasing) between
//! the liveness check and the swap: it fails if the cell moved at all.
//!
//! Until some contender runs that path, a lock held by a dead process
//! stays held. That is the accepted cost of not probing liveness on every
//! contention attempt.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::probe::ProcessProbe;

/// OS-level process identifier as stored in the shared block.
pub type Pid = u32;

/// Owner value meaning the lock is free.
const FREE: Pid = 0;

/// Failed acquire attempts between liveness probes of the current owner.
const LIVENESS_CHECK_PERIOD: u64 = 1000;

/// Observed owner of a [`ProcessLock`]: the tagged reading of the raw cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOwner {
    /// Nobody holds the lock.
    Free,
    /// Held by this pid, which is either live or awaiting reclamation.
    HeldBy(Pid),
}

impl LockOwner {
    fn from_raw(raw: Pid) -> Self {
        if raw == FREE {
            Self::Free
        } else {
            Self::HeldBy(raw)
        }
    }
}

/// Mutual exclusion across processes, resident in the shared block.
///
/// Created implicitly when the block is zero-initialized (a zeroed cell is
/// a free lock) and never destroyed; it outlives any single holder.
#[repr(transparent)]
pub struct ProcessLock {
    owner: AtomicU32,
}

impl ProcessLock {
    /// A free lock. Only useful for process-local blocks; the shared
    /// mapping gets its locks from kernel zero-fill.
    pub const fn new() -> Self {
        Self {
            owner: AtomicU32::new(FREE),
        }
    }

    /// Snapshot of the current owner. Stale the moment it is read.
    pub fn owner(&self) -> LockOwner {
        LockOwner::from_raw(self.owner.load(Ordering::Acquire))
    }

    /// Spin until this process holds the lock.
    ///
    /// Busy-polls rather than parking on a kernel wait object; hold times
    /// in this system are short. Every [`LIVENESS_CHECK_PERIOD`] failed
    /// attempts the current owner is probed, and a dead owner is reclaimed
    /// in place.
    pub fn acquire(&self, self_pid: Pid, probe: &dyn ProcessProbe) {
        let mut attempts: u64 = 0;
        loop {
            if self
                .owner
                .compare_exchange(FREE, self_pid, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return;
            }

            attempts += 1;
            if attempts % LIVENESS_CHECK_PERIOD == 0 {
                let observed = self.owner.load(Ordering::Acquire);
                if observed != FREE
                    && !probe.is_alive(observed)
                    && self
                        .owner
                        .compare_exchange(observed, self_pid, Ordering::Acquire, Ordering::Relaxed)
                        .is_ok()
                {
                    return;
                }
            }

            std::hint::spin_loop();
        }
    }

    /// Single acquisition attempt.
    ///
    /// Succeeds immediately if this process already owns the lock
    /// (re-entry by the same long-lived process is intentional, to support
    /// repeated "am I main?" polling). Otherwise one swap from free, or
    /// one reclamation swap if the recorded owner is dead.
    pub fn try_acquire(&self, self_pid: Pid, probe: &dyn ProcessProbe) -> bool {
        let observed = self.owner.load(Ordering::Acquire);
        if observed == self_pid {
            return true;
        }

        if observed == FREE {
            return self
                .owner
                .compare_exchange(FREE, self_pid, Ordering::Acquire, Ordering::Relaxed)
                .is_ok();
        }

        if probe.is_alive(observed) {
            return false;
        }

        self.owner
            .compare_exchange(observed, self_pid, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Hand the lock back. Must be called by the current owner.
    ///
    /// Releasing a lock this process does not hold means the shared state
    /// is already corrupt; that is a programming error and the process
    /// aborts rather than continuing.
    pub fn release(&self, self_pid: Pid) {
        if !self.try_release(self_pid) {
            tracing::error!(
                pid = self_pid,
                owner = ?self.owner(),
                "lock released by a non-owner"
            );
            std::process::abort();
        }
    }

    fn try_release(&self, self_pid: Pid) -> bool {
        self.owner
            .compare_exchange(self_pid, FREE, Ordering::Release, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for ProcessLock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::{LockOwner, ProcessLock};
    use crate::probe::stubs::FakeProcesses;

    #[test]
    fn acquire_and_release_round_trip() {
        let processes = FakeProcesses::new();
        processes.set_alive(11, true);

        let lock = ProcessLock::new();
        assert_eq!(lock.owner(), LockOwner::Free);

        lock.acquire(11, &processes);
        assert_eq!(lock.owner(), LockOwner::HeldBy(11));

        lock.release(11);
        assert_eq!(lock.owner(), LockOwner::Free);
    }

    #[test]
    fn try_acquire_fails_against_live_owner() {
        let processes = FakeProcesses::new();
        processes.set_alive(11, true);
        processes.set_alive(22, true);

        let lock = ProcessLock::new();
        assert!(lock.try_acquire(11, &processes));
        assert!(!lock.try_acquire(22, &processes));
        assert_eq!(lock.owner(), LockOwner::HeldBy(11));
    }

    #[test]
    fn try_acquire_is_idempotent_for_the_owner() {
        let processes = FakeProcesses::new();
        processes.set_alive(11, true);

        let lock = ProcessLock::new();
        assert!(lock.try_acquire(11, &processes));
        for _ in 0..5 {
            assert!(lock.try_acquire(11, &processes));
            assert_eq!(lock.owner(), LockOwner::HeldBy(11));
        }
    }

    #[test]
    fn try_acquire_reclaims_a_dead_owner() {
        let processes = FakeProcesses::new();
        processes.set_alive(77, true);
        processes.set_alive(11, true);

        let lock = ProcessLock::new();
        assert!(lock.try_acquire(77, &processes));

        processes.set_alive(77, false);
        assert!(lock.try_acquire(11, &processes));
        assert_eq!(lock.owner(), LockOwner::HeldBy(11));
    }

    #[test]
    fn acquire_reclaims_a_dead_owner() {
        let processes = FakeProcesses::new();
        processes.set_alive(11, true);

        let lock = ProcessLock::new();
        assert!(lock.try_acquire(77, &processes)); // 77 was never alive

        lock.acquire(11, &processes);
        assert_eq!(lock.owner(), LockOwner::HeldBy(11));
    }

    #[test]
    fn only_one_reclaimer_wins() {
        // A dead owner plus racing contenders: the reclamation swap from
        // the stale value must admit exactly one winner.
        for _ in 0..50 {
            let processes = Arc::new(FakeProcesses::new());
            processes.set_alive(11, true);
            processes.set_alive(22, true);
            processes.set_alive(33, true);

            let lock = Arc::new(ProcessLock::new());
            assert!(lock.try_acquire(77, &*processes));

            let wins = Arc::new(AtomicU32::new(0));
            let contenders: Vec<_> = [11, 22, 33]
                .into_iter()
                .map(|pid| {
                    let lock = Arc::clone(&lock);
                    let processes = Arc::clone(&processes);
                    let wins = Arc::clone(&wins);
                    std::thread::spawn(move || {
                        if lock.try_acquire(pid, &*processes) {
                            wins.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for contender in contenders {
                contender.join().unwrap();
            }

            assert_eq!(wins.load(Ordering::SeqCst), 1);
            assert_ne!(lock.owner(), LockOwner::Free);
            assert_ne!(lock.owner(), LockOwner::HeldBy(77));
        }
    }

    #[test]
    fn never_held_by_two_identities_at_once() {
        let processes = Arc::new(FakeProcesses::new());
        let lock = Arc::new(ProcessLock::new());
        let in_critical = Arc::new(AtomicU32::new(0));

        let workers: Vec<_> = (1..=4)
            .map(|pid| {
                processes.set_alive(pid, true);
                let lock = Arc::clone(&lock);
                let processes = Arc::clone(&processes);
                let in_critical = Arc::clone(&in_critical);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        lock.acquire(pid, &*processes);
                        assert_eq!(in_critical.swap(pid, Ordering::SeqCst), 0);
                        assert_eq!(in_critical.swap(0, Ordering::SeqCst), pid);
                        lock.release(pid);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(lock.owner(), LockOwner::Free);
    }

    #[test]
    fn release_by_non_owner_fails_the_precondition() {
        let processes = FakeProcesses::new();
        processes.set_alive(11, true);

        let lock = ProcessLock::new();
        assert!(lock.try_acquire(11, &processes));

        // The public release() aborts on this; the guarded swap is what
        // detects it.
        assert!(!lock.try_release(22));
        assert_eq!(lock.owner(), LockOwner::HeldBy(11));
        assert!(lock.try_release(11));
    }
}
