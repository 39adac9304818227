//! Cross-thread coordination between parameter updates and the redraw poller
//!
//! Two primitives:
//! - [`ChangeGate`]: a dirty flag set by change notifications and
//!   test-and-cleared by the poller with a single compare-exchange.
//! - [`ChainSnapshot`]: the currently published [`ProcessingChain`]. Writers
//!   build a complete new chain and swap the shared pointer, so a reader
//!   always sees one consistent set of coefficients.

use crate::domain::chain::ProcessingChain;
use crate::domain::parameters::{ParameterId, ParameterListener};
use crossbeam::utils::CachePadded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Atomic "parameters changed" flag
///
/// Cache-padded so the notifier and the poller do not false-share a line
/// with neighbouring data.
#[derive(Debug, Default)]
pub struct ChangeGate {
    dirty: CachePadded<AtomicBool>,
}

impl ChangeGate {
    /// Create a gate, optionally already armed
    pub fn new(dirty: bool) -> Self {
        Self {
            dirty: CachePadded::new(AtomicBool::new(dirty)),
        }
    }

    /// Record that something changed
    pub fn notify(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clear the flag, returning whether it was set
    ///
    /// A notification that lands after this returns `true` re-arms the gate
    /// for the next poll; none are lost.
    pub fn test_and_clear(&self) -> bool {
        self.dirty
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Peek without clearing
    pub fn is_set(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

impl ParameterListener for ChangeGate {
    fn parameter_value_changed(&self, id: ParameterId, _value: f64) {
        trace!(parameter = id.as_str(), "Change gate armed");
        self.notify();
    }
}

/// Publish point for the current processing chain
#[derive(Debug)]
pub struct ChainSnapshot {
    current: RwLock<Arc<ProcessingChain>>,
}

impl Default for ChainSnapshot {
    fn default() -> Self {
        Self::new(ProcessingChain::default())
    }
}

impl ChainSnapshot {
    pub fn new(chain: ProcessingChain) -> Self {
        Self {
            current: RwLock::new(Arc::new(chain)),
        }
    }

    /// Current chain; stays valid even if a newer one is published meanwhile
    pub fn load(&self) -> Arc<ProcessingChain> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the current chain, returning the previous one
    pub fn publish(&self, chain: ProcessingChain) -> Arc<ProcessingChain> {
        let next = Arc::new(chain);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::{ChainPosition, FilterChain};
    use crate::domain::coefficients::BiquadCoeffs;
    use std::thread;

    #[test]
    fn test_gate_fires_once_per_change() {
        let gate = ChangeGate::new(false);
        assert!(!gate.test_and_clear());

        gate.notify();
        gate.notify();
        assert!(gate.is_set());
        assert!(gate.test_and_clear());
        assert!(!gate.test_and_clear());
    }

    #[test]
    fn test_gate_can_start_armed() {
        let gate = ChangeGate::new(true);
        assert!(gate.test_and_clear());
        assert!(!gate.is_set());
    }

    #[test]
    fn test_gate_listener_arms() {
        let gate = ChangeGate::default();
        gate.parameter_value_changed(ParameterId::PeakGain, 3.0);
        assert!(gate.test_and_clear());
    }

    #[test]
    fn test_gate_never_misses_last_notification() {
        let gate = Arc::new(ChangeGate::new(false));
        let notifier = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                for _ in 0..10_000 {
                    gate.notify();
                }
            })
        };

        let mut observed = 0usize;
        while !notifier.is_finished() {
            if gate.test_and_clear() {
                observed += 1;
            }
        }
        notifier.join().unwrap();
        if gate.test_and_clear() {
            observed += 1;
        }

        assert!(observed >= 1);
        assert!(!gate.is_set());
    }

    #[test]
    fn test_snapshot_publish_swaps_whole_chain() {
        let snapshot = ChainSnapshot::default();
        let before = snapshot.load();
        assert_eq!(before.magnitude_at(1000.0, 48000.0), 1.0);

        let mut chain = ProcessingChain::default();
        *chain.get_mut(ChainPosition::Peak) =
            FilterChain::single(Arc::new(BiquadCoeffs::peaking(48000.0, 1000.0, 6.0, 1.0)));
        let previous = snapshot.publish(chain);

        assert!(Arc::ptr_eq(&previous, &before));
        // Readers holding the old snapshot keep a consistent view
        assert_eq!(before.magnitude_at(1000.0, 48000.0), 1.0);
        let db = 20.0 * snapshot.load().magnitude_at(1000.0, 48000.0).log10();
        assert!((db - 6.0).abs() < 1e-9);
    }
}
