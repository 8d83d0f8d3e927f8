//! Worker Admission Module
//!
//! Bounds the number of concurrently executing request handlers.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{Result, ServerError};

// == Admission Gate ==
/// Counting gate limiting concurrent request execution to the pool size.
///
/// Connections themselves are unbounded; only the work past this gate is
/// capped. Waiters queue on the semaphore in FIFO order, so none starves
/// under bounded load.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    slots: Arc<Semaphore>,
    pool_size: usize,
}

impl AdmissionGate {
    // == Constructor ==
    /// Creates a gate with `pool_size` execution slots.
    ///
    /// A zero-slot gate would deadlock every request, so it is rejected
    /// at construction.
    pub fn new(pool_size: usize) -> Result<Self> {
        if pool_size == 0 {
            return Err(ServerError::InvalidCapacity {
                component: "worker pool",
            });
        }
        Ok(Self {
            slots: Arc::new(Semaphore::new(pool_size)),
            pool_size,
        })
    }

    // == Acquire ==
    /// Waits for a free slot and claims it.
    ///
    /// The returned permit releases the slot when dropped, which covers
    /// every exit path of the holder, early returns and panics included.
    pub async fn acquire(&self) -> AdmissionPermit {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .expect("admission semaphore is never closed");
        AdmissionPermit { _permit: permit }
    }

    // == Available ==
    /// Returns the number of currently free slots.
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    // == Pool Size ==
    /// Returns the configured slot count.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

// == Admission Permit ==
/// A claimed execution slot; dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}
