//! In-flight event tracking.
//!
//! Every event admitted for bridging holds an [`InFlightGuard`] until its
//! processing ends. The guard releases the id when dropped, so success,
//! failure and panics all clear the claim.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Ids currently being processed by this run. Never persisted.
#[derive(Debug, Default)]
pub struct InFlightSet {
    ids: Mutex<HashSet<String>>,
}

impl InFlightSet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.ids().contains(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    /// Claim `id` if `check` accepts it.
    ///
    /// `check` receives whether the id is already in flight and runs while
    /// the set is locked, so no other task can claim the same id between the
    /// check and the insert.
    pub fn try_claim_with<R, F>(self: &Arc<Self>, id: &str, check: F) -> Result<InFlightGuard, R>
    where
        F: FnOnce(bool) -> Result<(), R>,
    {
        let mut ids = self.ids();
        check(ids.contains(id))?;
        ids.insert(id.to_string());

        Ok(InFlightGuard {
            set: Arc::clone(self),
            id: id.to_string(),
        })
    }

    fn ids(&self) -> MutexGuard<'_, HashSet<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive claim on one event id; released on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    set: Arc<InFlightSet>,
    id: String,
}

impl InFlightGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.ids().remove(&self.id);
    }
}
