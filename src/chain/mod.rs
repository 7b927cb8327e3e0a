//! Chain module - JSON-RPC access to a single endpoint
//!
//! The submitter talks to the chain through the [`Rpc`] trait so batch runs
//! can be driven by a scripted stub in tests.

pub mod provider;

pub use provider::{ChainProvider, GasPrice};

use crate::error::DeployResult;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TransactionReceipt, H256};

/// The RPC surface a batch run depends on
#[async_trait]
pub trait Rpc: Send + Sync {
    /// Pending-state transaction count for an account.
    async fn pending_nonce(&self, address: Address) -> DeployResult<u64>;

    /// Suggested gas price under the configured strategy, unbuffered.
    async fn suggest_gas_price(&self) -> DeployResult<GasPrice>;

    /// Broadcast a signed raw transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> DeployResult<H256>;

    /// Receipt for a transaction, if mined.
    async fn transaction_receipt(&self, tx_hash: H256)
        -> DeployResult<Option<TransactionReceipt>>;
}
