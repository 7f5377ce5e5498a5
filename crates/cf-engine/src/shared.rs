//! A circuit shared between threads.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cf_core::{CircuitResult, CompId};

use crate::circuit::Circuit;

/// A circuit behind a mutex, so several threads can trigger roots.
///
/// Every trigger holds the lock for its whole propagation chain, so two
/// triggers never interleave inside one circuit.
#[derive(Clone, Default)]
pub struct SharedCircuit {
    inner: Arc<Mutex<Circuit>>,
}

impl SharedCircuit {
    pub fn new(circuit: Circuit) -> Self {
        Self {
            inner: Arc::new(Mutex::new(circuit)),
        }
    }

    /// Lock the circuit. A panic in another trigger does not poison it for
    /// good; the circuit is handed out as it was left.
    pub fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the circuit.
    pub fn with<R>(&self, f: impl FnOnce(&mut Circuit) -> R) -> R {
        f(&mut self.lock())
    }

    /// Tick a root component under the lock.
    pub fn tick(&self, id: CompId) -> CircuitResult<()> {
        self.lock().tick(id)
    }
}

impl From<Circuit> for SharedCircuit {
    fn from(circuit: Circuit) -> Self {
        Self::new(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_circuit() {
        let shared = SharedCircuit::new(Circuit::new());
        let other = shared.clone();
        let name = other.with(|c| c.unique_name("Node"));
        assert_eq!(name, "Node0");
        assert_eq!(shared.with(|c| c.unique_name("Node")), "Node1");
    }
}
