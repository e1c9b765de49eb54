//! Collision-free nonce allocation.
//!
//! The counter is seeded once from the account's pending transaction count and
//! never re-synced. Transactions sent from the same account by anything other
//! than this sequencer will desynchronize it; restart the client to recover.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::observability::metrics;

/// Hands out strictly increasing nonces, one per call.
#[derive(Debug)]
pub struct NonceSequencer {
    next: AtomicU64,
}

impl NonceSequencer {
    /// Create a sequencer whose first allocation returns `start`.
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Take the next nonce.
    ///
    /// The read-modify-write is a single atomic step, so concurrent callers
    /// always receive distinct, gap-free values.
    pub fn allocate(&self) -> u64 {
        let nonce = self.next.fetch_add(1, Ordering::SeqCst);
        metrics::record_nonce_allocated();
        nonce
    }

    /// Value the next `allocate` call will return.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}
