//! Named shared-memory block holding the [`SharedState`] layout.
//!
//! The first process to open the block creates and implicitly
//! zero-initializes it; later openers attach to whatever is already
//! there. The creator unlinks the segment when it drops gracefully.
//! That teardown is best-effort only: any participant can be killed
//! without cleanup, in which case the segment simply outlives them all,
//! which is also what carries state across a main restart.

use shared_memory::{Shmem, ShmemConf, ShmemError};

use crate::error::{Error, Result};
use crate::state::SharedState;

/// A mapping of the coordination block: either the named OS segment
/// shared with other processes, or a process-local allocation with the
/// same layout for tests and single-process use.
pub struct SharedBlock {
    backing: Backing,
}

enum Backing {
    Os(Shmem),
    Local(Box<SharedState>),
}

// The mapping is plain bytes; every access goes through the atomics in
// `SharedState`, and the local backing is heap-owned.
#[allow(unsafe_code)]
unsafe impl Send for SharedBlock {}
#[allow(unsafe_code)]
unsafe impl Sync for SharedBlock {}

impl SharedBlock {
    /// Attach to the named block, creating it if this is the first opener.
    ///
    /// A creation loss to a racing process falls back to opening the
    /// winner's segment; its zero-fill is the initialization. Any other
    /// failure is fatal at startup.
    pub fn open_or_create(name: &str) -> Result<Self> {
        match ShmemConf::new().os_id(name).size(SharedState::SIZE).open() {
            Ok(shmem) => return Self::attach(name, shmem),
            // Not created yet; fall through to the creation path.
            Err(ShmemError::MapOpenFailed(_)) => {}
            Err(source) => {
                return Err(Error::ResourceInit {
                    name: name.to_owned(),
                    source,
                })
            }
        }

        match ShmemConf::new().os_id(name).size(SharedState::SIZE).create() {
            Ok(shmem) => Self::attach(name, shmem),
            // Lost the creation race; the winner's segment is the one.
            Err(ShmemError::MappingIdExists) => {
                let shmem = ShmemConf::new()
                    .os_id(name)
                    .size(SharedState::SIZE)
                    .open()
                    .map_err(|source| Error::ResourceInit {
                        name: name.to_owned(),
                        source,
                    })?;
                Self::attach(name, shmem)
            }
            Err(source) => Err(Error::ResourceInit {
                name: name.to_owned(),
                source,
            }),
        }
    }

    /// A block private to this process: same layout, no OS segment.
    ///
    /// Used by tests to simulate several participants inside one process,
    /// and by anything that wants the coordinator without cross-process
    /// visibility.
    pub fn process_local() -> Self {
        Self {
            backing: Backing::Local(Box::new(SharedState::new())),
        }
    }

    fn attach(name: &str, shmem: Shmem) -> Result<Self> {
        if shmem.len() < SharedState::SIZE {
            return Err(Error::BlockTooSmall {
                name: name.to_owned(),
                actual: shmem.len(),
                required: SharedState::SIZE,
            });
        }
        Ok(Self {
            backing: Backing::Os(shmem),
        })
    }

    /// Typed view of the mapping.
    #[allow(unsafe_code)]
    pub fn state(&self) -> &SharedState {
        match &self.backing {
            // Size is validated at attach time and mmap hands back
            // page-aligned memory, so the cast is in-bounds and aligned.
            Backing::Os(shmem) => unsafe { &*shmem.as_ptr().cast::<SharedState>() },
            Backing::Local(state) => state,
        }
    }

    /// Whether this process created the segment (and will unlink it on a
    /// graceful drop).
    pub fn is_creator(&self) -> bool {
        match &self.backing {
            Backing::Os(shmem) => shmem.is_owner(),
            Backing::Local(_) => true,
        }
    }
}
