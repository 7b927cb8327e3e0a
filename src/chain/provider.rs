//! HTTP provider for a configured endpoint

use super::Rpc;
use crate::config::GasPriceStrategy;
use crate::endpoints::EndpointConfig;
use crate::error::{DeployError, DeployResult};

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, BlockNumber, Bytes, TransactionReceipt, H256, U256};
use std::time::Duration;
use tracing::{debug, info};

/// Gas price types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasPrice {
    Legacy(U256),
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

/// Provider over a single HTTP JSON-RPC endpoint
pub struct ChainProvider {
    provider: Provider<Http>,
    endpoint: EndpointConfig,
    strategy: GasPriceStrategy,
}

impl ChainProvider {
    /// Dial the endpoint and verify the node reports the configured chain id.
    pub async fn connect(
        endpoint: &EndpointConfig,
        strategy: GasPriceStrategy,
    ) -> DeployResult<Self> {
        let provider = Provider::<Http>::try_from(endpoint.rpc_url.as_str())
            .map_err(|e| DeployError::Connection {
                url: endpoint.rpc_url.clone(),
                message: e.to_string(),
            })?
            .interval(Duration::from_millis(100));

        let node_chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| DeployError::Connection {
                url: endpoint.rpc_url.clone(),
                message: e.to_string(),
            })?;

        if node_chain_id != U256::from(endpoint.chain_id) {
            return Err(DeployError::Config(format!(
                "Endpoint '{}' is configured for chain {} but the node reports {}",
                endpoint.name, endpoint.chain_id, node_chain_id
            )));
        }

        info!(
            "Connected to {} (chain {}) at {}",
            endpoint.name, endpoint.chain_id, endpoint.rpc_url
        );

        Ok(Self {
            provider,
            endpoint: endpoint.clone(),
            strategy,
        })
    }

    /// Estimate EIP-1559 fees from the latest block base fee.
    async fn estimate_eip1559_fees(&self) -> DeployResult<(U256, U256)> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| DeployError::GasPrice(e.to_string()))?
            .ok_or_else(|| DeployError::GasPrice("No latest block".to_string()))?;

        let base_fee = block
            .base_fee_per_gas
            .ok_or_else(|| DeployError::GasPrice("No base fee in latest block".to_string()))?;

        let priority_fee = U256::from(2_000_000_000u64); // 2 gwei default

        // Max fee = 2 * base_fee + priority_fee (buffer for block variability)
        let max_fee = base_fee * 2 + priority_fee;

        Ok((max_fee, priority_fee))
    }
}

#[async_trait]
impl Rpc for ChainProvider {
    async fn pending_nonce(&self, address: Address) -> DeployResult<u64> {
        let nonce = self
            .provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| DeployError::NonceFetch(e.to_string()))?;
        Ok(nonce.as_u64())
    }

    async fn suggest_gas_price(&self) -> DeployResult<GasPrice> {
        let price = match self.strategy {
            GasPriceStrategy::Legacy => {
                let price = self
                    .provider
                    .get_gas_price()
                    .await
                    .map_err(|e| DeployError::GasPrice(e.to_string()))?;
                GasPrice::Legacy(price)
            }
            GasPriceStrategy::Eip1559 => {
                let (max_fee, priority_fee) = self.estimate_eip1559_fees().await?;
                GasPrice::Eip1559 {
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: priority_fee,
                }
            }
        };
        debug!("Suggested gas price on {}: {:?}", self.endpoint.name, price);
        Ok(price)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> DeployResult<H256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| DeployError::Send(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> DeployResult<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| DeployError::Connection {
                url: self.endpoint.rpc_url.clone(),
                message: e.to_string(),
            })
    }
}
