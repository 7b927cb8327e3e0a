//! Batch transaction submitter
//!
//! Signs and broadcasts N templated transactions in strict attempt order,
//! one nonce apart, streaming per-attempt results into a caller-supplied
//! sink. Transient failures are retried with backoff after re-syncing the
//! nonce and gas price; permanent failures stop the run. A stalled receipt
//! wait is replaced with a gas-bumped transaction on the same nonce.

use super::gas::GasEstimator;
use super::nonce::NonceSequence;
use super::report::{SubmissionReport, SubmissionSink};
use super::template::TxTemplate;
use crate::chain::{GasPrice, Rpc};
use crate::config::SubmitterConfig;
use crate::endpoints::EndpointConfig;
use crate::error::{DeployError, DeployResult};

use chrono::{DateTime, Utc};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, H256, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

const MAX_BACKOFF_MS: u64 = 30_000;

/// Final state of a batch run
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub confirmed: u32,
    pub total_gas: U256,
    /// Next unused nonce, for resuming a partially completed batch
    pub next_nonce: u64,
}

pub struct BatchSubmitter<R: Rpc + ?Sized> {
    rpc: Arc<R>,
    endpoint: EndpointConfig,
    wallet: LocalWallet,
    estimator: GasEstimator,
    config: SubmitterConfig,
    cancel: watch::Receiver<bool>,
}

impl<R: Rpc + ?Sized> BatchSubmitter<R> {
    pub fn new(
        rpc: Arc<R>,
        endpoint: EndpointConfig,
        private_key: &str,
        config: SubmitterConfig,
        cancel: watch::Receiver<bool>,
    ) -> DeployResult<Self> {
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| DeployError::Wallet(format!("invalid private key: {}", e)))?
            .with_chain_id(endpoint.chain_id);

        Ok(Self {
            rpc,
            endpoint,
            wallet,
            estimator: GasEstimator::new(&config),
            config,
            cancel,
        })
    }

    pub fn sender_address(&self) -> Address {
        self.wallet.address()
    }

    /// Run attempts `start..count` of the batch.
    ///
    /// Emits one `Submitted`/`Confirmed` (or `Failed`) report per attempt
    /// and a final `Completed` summary on every exit path.
    pub async fn run(
        &self,
        template: &TxTemplate,
        count: u32,
        start: u32,
        sink: &dyn SubmissionSink,
    ) -> DeployResult<BatchOutcome> {
        let started_at = Utc::now();
        let mut cancel = self.cancel.clone();

        info!(
            "Starting batch of {} {} transactions on {} from {:?}",
            count.saturating_sub(start),
            template.kind(),
            self.endpoint.name,
            self.wallet.address()
        );

        let (mut nonces, mut gas_price) = match self.starting_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                sink.report(SubmissionReport::Failed {
                    index: start,
                    error: e.to_string(),
                })
                .await;
                self.emit_summary(sink, 0, U256::zero(), 0, started_at).await;
                return Err(e);
            }
        };

        let mut total_gas = U256::zero();
        let mut confirmed = 0u32;

        for index in start..count {
            if *cancel.borrow() {
                self.emit_summary(sink, confirmed, total_gas, nonces.current(), started_at)
                    .await;
                return Err(DeployError::Cancelled);
            }

            match self
                .submit_one(
                    template, index, total_gas, &mut nonces, &mut gas_price, &mut cancel, sink,
                )
                .await
            {
                Ok(gas_used) => {
                    total_gas += gas_used;
                    confirmed += 1;
                }
                Err(e) => {
                    if !matches!(e, DeployError::Cancelled) {
                        sink.report(SubmissionReport::Failed {
                            index,
                            error: e.to_string(),
                        })
                        .await;
                    }
                    self.emit_summary(sink, confirmed, total_gas, nonces.current(), started_at)
                        .await;
                    return Err(e);
                }
            }

            if index + 1 < count && self.config.inter_tx_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.inter_tx_delay_ms)).await;
            }
        }

        self.emit_summary(sink, confirmed, total_gas, nonces.current(), started_at)
            .await;
        info!(
            "Batch complete on {}: {} confirmed, {} gas used",
            self.endpoint.name, confirmed, total_gas
        );

        Ok(BatchOutcome {
            confirmed,
            total_gas,
            next_nonce: nonces.current(),
        })
    }

    /// Submit one attempt, retrying transient failures up to the configured
    /// budget. Returns the gas used by the mined transaction.
    #[allow(clippy::too_many_arguments)]
    async fn submit_one(
        &self,
        template: &TxTemplate,
        index: u32,
        total_gas_before: U256,
        nonces: &mut NonceSequence,
        gas_price: &mut GasPrice,
        cancel: &mut watch::Receiver<bool>,
        sink: &dyn SubmissionSink,
    ) -> DeployResult<U256> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if *cancel.borrow() {
                return Err(DeployError::Cancelled);
            }

            let nonce = nonces.current();
            let tx = template.build(nonce, gas_price, self.endpoint.chain_id);

            let signature = self
                .wallet
                .sign_transaction(&tx)
                .await
                .map_err(|e| DeployError::Signing(e.to_string()))?;
            let raw = tx.rlp_signed(&signature);

            match self.rpc.send_raw_transaction(raw).await {
                Ok(tx_hash) => {
                    debug!(
                        "Sent tx {} (nonce {}, attempt {}/{}): {:?}",
                        index, nonce, attempts, self.config.max_retries, tx_hash
                    );
                    sink.report(SubmissionReport::Submitted {
                        index,
                        nonce,
                        tx_hash: format!("{:#x}", tx_hash),
                    })
                    .await;

                    match self.wait_for_receipt(tx_hash, index, cancel).await {
                        Ok(receipt) => {
                            let gas_used = receipt.gas_used.unwrap_or_default();
                            nonces.advance();
                            sink.report(SubmissionReport::Confirmed {
                                index,
                                nonce,
                                tx_hash: format!("{:#x}", tx_hash),
                                gas_used,
                                total_gas: total_gas_before + gas_used,
                                explorer_link: self.endpoint.tx_link(&format!("{:#x}", tx_hash)),
                            })
                            .await;
                            return Ok(gas_used);
                        }
                        Err(e) if e.is_retryable() && attempts < self.config.max_retries => {
                            // Same nonce, higher gas: replace the stuck tx
                            *gas_price = self.estimator.speed_up(gas_price);
                            warn!(
                                "Receipt wait failed for tx {} ({}), replacing with bumped gas",
                                index, e
                            );
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => {
                    let e = classify_send_error(e);
                    if e.is_retryable() && attempts < self.config.max_retries {
                        warn!(
                            "Send failed for tx {} (attempt {}/{}): {}",
                            index, attempts, self.config.max_retries, e
                        );
                        self.backoff(attempts).await;
                        // Recovery fetches are best-effort within the same
                        // budget: a transient failure here keeps the local
                        // state and lets the next send attempt retry it
                        if let Err(sync_err) = nonces.sync(self.rpc.as_ref()).await {
                            if !sync_err.is_retryable() {
                                return Err(sync_err);
                            }
                            warn!(
                                "Nonce re-sync failed for tx {} ({}), keeping local nonce",
                                index, sync_err
                            );
                        }
                        if let Ok(suggested) = self.rpc.suggest_gas_price().await {
                            *gas_price = self.estimator.buffered(suggested);
                        }
                    } else {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Snapshot the pending nonce and a starting gas price, retrying
    /// transient failures with the same budget as sends.
    async fn starting_snapshot(&self) -> DeployResult<(NonceSequence, GasPrice)> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let snapshot = async {
                let nonces =
                    NonceSequence::init(self.rpc.as_ref(), self.wallet.address()).await?;
                let gas_price = self.estimator.buffered(self.rpc.suggest_gas_price().await?);
                DeployResult::Ok((nonces, gas_price))
            }
            .await;

            match snapshot {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if e.is_retryable() && attempts < self.config.max_retries => {
                    warn!(
                        "Chain snapshot failed (attempt {}/{}): {}",
                        attempts, self.config.max_retries, e
                    );
                    self.backoff(attempts).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll for a receipt until the configured timeout, observing the
    /// cancel signal between polls. A reverted transaction is terminal.
    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        index: u32,
        cancel: &mut watch::Receiver<bool>,
    ) -> DeployResult<TransactionReceipt> {
        let deadline = Instant::now() + Duration::from_secs(self.config.receipt_timeout_secs);
        let poll = Duration::from_millis(self.config.receipt_poll_interval_ms);

        loop {
            match self.rpc.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status == Some(0u64.into()) {
                        return Err(DeployError::Receipt(format!(
                            "transaction {:#x} reverted",
                            tx_hash
                        )));
                    }
                    return Ok(receipt);
                }
                Ok(None) => {}
                // Transient RPC failures inside the poll window are tolerated
                Err(e) => debug!("Receipt poll error for {:#x}: {}", tx_hash, e),
            }

            if Instant::now() >= deadline {
                return Err(DeployError::Timeout {
                    operation: format!("receipt for tx {} ({:#x})", index, tx_hash),
                });
            }

            tokio::select! {
                _ = sleep(poll) => {}
                changed = cancel.changed() => {
                    match changed {
                        Ok(()) if *cancel.borrow() => return Err(DeployError::Cancelled),
                        Ok(()) => {}
                        // Sender gone: cancellation can no longer arrive
                        Err(_) => sleep(poll).await,
                    }
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self
            .config
            .retry_delay_ms
            .saturating_mul(1u64 << (attempt - 1).min(5))
            .min(MAX_BACKOFF_MS);
        sleep(Duration::from_millis(delay)).await;
    }

    async fn emit_summary(
        &self,
        sink: &dyn SubmissionSink,
        confirmed: u32,
        total_gas: U256,
        next_nonce: u64,
        started_at: DateTime<Utc>,
    ) {
        sink.report(SubmissionReport::Completed {
            confirmed,
            total_gas,
            next_nonce,
            started_at,
            finished_at: Utc::now(),
        })
        .await;
    }
}

/// Map node rejection messages onto the error taxonomy. Insufficient funds
/// is permanent; everything else a node rejects at send time is assumed
/// transient (nonce races, replacement pricing, pool limits).
fn classify_send_error(error: DeployError) -> DeployError {
    match error {
        DeployError::Send(message) if message.contains("insufficient funds") => {
            DeployError::InsufficientFunds(message)
        }
        other => other,
    }
}
