//! Nonce tracking for a single batch run
//!
//! A run snapshots the pending nonce once, advances it locally per confirmed
//! transaction, and re-syncs with the chain when a transient send failure
//! leaves the local cursor in doubt.

use crate::chain::Rpc;
use crate::error::DeployResult;

use ethers::types::Address;
use tracing::{debug, warn};

/// Strictly increasing nonce cursor owned by one batch run
pub struct NonceSequence {
    address: Address,
    next: u64,
}

impl NonceSequence {
    /// Snapshot the pending nonce for `address`.
    pub async fn init<R: Rpc + ?Sized>(rpc: &R, address: Address) -> DeployResult<Self> {
        let base = rpc.pending_nonce(address).await?;
        debug!("Base nonce for {:?}: {}", address, base);
        Ok(Self { address, next: base })
    }

    /// Nonce for the current attempt.
    pub fn current(&self) -> u64 {
        self.next
    }

    /// Advance after a confirmed transaction.
    pub fn advance(&mut self) {
        self.next += 1;
    }

    /// Re-sync the cursor with the chain's pending nonce.
    pub async fn sync<R: Rpc + ?Sized>(&mut self, rpc: &R) -> DeployResult<()> {
        let on_chain = rpc.pending_nonce(self.address).await?;
        if on_chain != self.next {
            warn!(
                "Nonce cursor out of sync for {:?}: local {}, chain {}",
                self.address, self.next, on_chain
            );
        }
        self.next = on_chain;
        Ok(())
    }
}
