use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// Per-doctor serialization point for the booking critical section.
///
/// The conflict check and the subsequent write are two separate repository
/// calls; holding the doctor's lock across both closes the read-then-write
/// race where two concurrent requests both see a slot as free. Scope is one
/// process, which matches the single-node deployment model (distributed
/// locking is an explicit non-goal).
#[derive(Clone, Default)]
pub struct DoctorLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl DoctorLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily creates the lock for a doctor. Callers hold the returned
    /// mutex for the duration of check-then-write.
    pub fn for_doctor(&self, doctor_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().expect("doctor lock registry poisoned");
        map.entry(doctor_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
