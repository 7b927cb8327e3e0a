//! Per-attempt submission reports and the sink they stream into

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::types::U256;
use serde::Serialize;
use tokio::sync::mpsc;

/// One result per batch attempt, in strict attempt order, plus a final
/// summary. Reports are ephemeral; nothing here is persisted.
#[derive(Debug, Clone, Serialize)]
pub enum SubmissionReport {
    /// Transaction broadcast, receipt not yet seen
    Submitted {
        index: u32,
        nonce: u64,
        tx_hash: String,
    },
    /// Transaction mined successfully
    Confirmed {
        index: u32,
        nonce: u64,
        tx_hash: String,
        gas_used: U256,
        /// Accumulated gas over the run so far
        total_gas: U256,
        explorer_link: String,
    },
    /// Attempt failed terminally; the run stops after this report
    Failed { index: u32, error: String },
    /// Final summary, emitted on completion, failure and cancellation
    Completed {
        confirmed: u32,
        total_gas: U256,
        /// Next unused nonce; a resumed batch starts here
        next_nonce: u64,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    },
}

/// Caller-supplied consumer of submission reports
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn report(&self, report: SubmissionReport);
}

/// Sink that forwards reports into an unbounded channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SubmissionReport>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<SubmissionReport>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl SubmissionSink for ChannelSink {
    async fn report(&self, report: SubmissionReport) {
        // A closed receiver just means no one is watching anymore
        let _ = self.tx.send(report);
    }
}
