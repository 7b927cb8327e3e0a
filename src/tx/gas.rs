//! Gas price buffering, capping and speed-up

use crate::chain::GasPrice;
use crate::config::SubmitterConfig;

use ethers::types::U256;

const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Applies the configured buffer, cap and speed-up factor to suggested
/// gas prices.
pub struct GasEstimator {
    buffer_percent: u64,
    speed_up_percent: u64,
    max_gas_price_wei: U256,
}

impl GasEstimator {
    pub fn new(config: &SubmitterConfig) -> Self {
        Self {
            buffer_percent: config.gas_price_buffer_percent,
            speed_up_percent: config.speed_up_percent,
            max_gas_price_wei: U256::from(config.max_gas_price_gwei) * U256::from(WEI_PER_GWEI),
        }
    }

    /// Buffer a suggested gas price and cap it at the configured maximum.
    pub fn buffered(&self, suggested: GasPrice) -> GasPrice {
        self.scaled(&suggested, 100 + self.buffer_percent)
    }

    /// Gas price for replacing a stuck transaction with the same nonce.
    pub fn speed_up(&self, current: &GasPrice) -> GasPrice {
        self.scaled(current, self.speed_up_percent)
    }

    fn scaled(&self, price: &GasPrice, percent: u64) -> GasPrice {
        let cap = |v: U256| std::cmp::min(v, self.max_gas_price_wei);
        match price {
            GasPrice::Legacy(p) => GasPrice::Legacy(cap(*p * percent / 100)),
            GasPrice::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let max_fee = cap(*max_fee_per_gas * percent / 100);
                // A priority fee above the max fee is rejected by every node
                GasPrice::Eip1559 {
                    max_fee_per_gas: max_fee,
                    max_priority_fee_per_gas: std::cmp::min(
                        *max_priority_fee_per_gas * percent / 100,
                        max_fee,
                    ),
                }
            }
        }
    }

    /// Worst-case cost of one transaction in wei.
    pub fn cost(gas_limit: U256, gas_price: &GasPrice) -> U256 {
        match gas_price {
            GasPrice::Legacy(price) => gas_limit * *price,
            GasPrice::Eip1559 {
                max_fee_per_gas, ..
            } => gas_limit * *max_fee_per_gas,
        }
    }
}
