//! Transaction templates for batch submission
//!
//! A template fixes everything about a transaction except its nonce, gas
//! price and chain id, which the batch run supplies per attempt.

use crate::chain::GasPrice;
use crate::error::{DeployError, DeployResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, TransactionRequest, U256};

/// Runtime bytecode of a minimal storage contract, used as the default
/// contract-creation payload.
pub const STORAGE_CONTRACT_BYTECODE: &str = "6080604052348015600f57600080fd5b5060a08061001d6000396000f3fe608060405260043610603f5760003560e01c80636057361d1460445780636d4ce63c14605e575b600080fd5b605c60048036036020811015605857600080fd5b50356067565b005b348015606957600080fd5b5060706073565b005b56fea26469706673582212207e450dcde54ac92df0b002d3cf04dd1d2331d7685cf4be5f2b5e2dc5dbedcbe564736f6c63430008090033";

pub const DEFAULT_DEPLOY_GAS_LIMIT: u64 = 2_000_000;
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

#[derive(Debug, Clone)]
pub enum TxTemplate {
    /// Contract creation: no recipient, fixed init bytecode
    ContractCreation {
        bytecode: Bytes,
        gas_limit: U256,
        value: U256,
    },
    /// Plain ETH transfer
    Transfer {
        to: Address,
        value: U256,
        gas_limit: U256,
    },
}

impl TxTemplate {
    /// Contract-creation template from hex bytecode (with or without 0x).
    pub fn contract_creation(bytecode_hex: &str, gas_limit: u64, value: U256) -> DeployResult<Self> {
        let stripped = bytecode_hex
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        let bytecode = hex::decode(stripped)
            .map_err(|e| DeployError::Template(format!("invalid bytecode hex: {}", e)))?;
        if bytecode.is_empty() {
            return Err(DeployError::Template("empty bytecode".to_string()));
        }
        Ok(Self::ContractCreation {
            bytecode: Bytes::from(bytecode),
            gas_limit: U256::from(gas_limit),
            value,
        })
    }

    /// The built-in storage-contract template.
    pub fn storage_contract() -> DeployResult<Self> {
        Self::contract_creation(STORAGE_CONTRACT_BYTECODE, DEFAULT_DEPLOY_GAS_LIMIT, U256::zero())
    }

    /// ETH transfer template to a hex-encoded recipient address.
    pub fn transfer(to: &str, value: U256) -> DeployResult<Self> {
        let to: Address = to
            .trim()
            .parse()
            .map_err(|e| DeployError::Template(format!("invalid recipient address: {}", e)))?;
        Ok(Self::Transfer {
            to,
            value,
            gas_limit: U256::from(TRANSFER_GAS_LIMIT),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContractCreation { .. } => "contract creation",
            Self::Transfer { .. } => "transfer",
        }
    }

    /// Build a typed transaction for one attempt.
    pub fn build(&self, nonce: u64, gas_price: &GasPrice, chain_id: u64) -> TypedTransaction {
        let mut typed = match gas_price {
            GasPrice::Legacy(price) => {
                let mut tx = TransactionRequest::new()
                    .nonce(nonce)
                    .gas_price(*price);
                tx = match self {
                    Self::ContractCreation {
                        bytecode,
                        gas_limit,
                        value,
                    } => tx.data(bytecode.clone()).gas(*gas_limit).value(*value),
                    Self::Transfer {
                        to,
                        value,
                        gas_limit,
                    } => tx.to(*to).value(*value).gas(*gas_limit),
                };
                TypedTransaction::Legacy(tx)
            }
            GasPrice::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let mut tx = Eip1559TransactionRequest::new()
                    .nonce(nonce)
                    .max_fee_per_gas(*max_fee_per_gas)
                    .max_priority_fee_per_gas(*max_priority_fee_per_gas);
                tx = match self {
                    Self::ContractCreation {
                        bytecode,
                        gas_limit,
                        value,
                    } => tx.data(bytecode.clone()).gas(*gas_limit).value(*value),
                    Self::Transfer {
                        to,
                        value,
                        gas_limit,
                    } => tx.to(*to).value(*value).gas(*gas_limit),
                };
                TypedTransaction::Eip1559(tx)
            }
        };
        typed.set_chain_id(chain_id);
        typed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_contract_builds_creation_tx() {
        let template = TxTemplate::storage_contract().unwrap();
        let tx = template.build(7, &GasPrice::Legacy(U256::from(1_000u64)), 11155111);

        assert!(tx.to().is_none());
        assert_eq!(tx.nonce(), Some(&U256::from(7u64)));
        assert_eq!(tx.gas(), Some(&U256::from(DEFAULT_DEPLOY_GAS_LIMIT)));
        assert_eq!(tx.chain_id(), Some(11155111u64.into()));
        assert!(!tx.data().unwrap().is_empty());
    }

    #[test]
    fn transfer_builds_eip1559_tx() {
        let template =
            TxTemplate::transfer("0x000000000000000000000000000000000000dEaD", U256::from(10u64))
                .unwrap();
        let tx = template.build(
            0,
            &GasPrice::Eip1559 {
                max_fee_per_gas: U256::from(30u64),
                max_priority_fee_per_gas: U256::from(2u64),
            },
            1,
        );

        assert!(matches!(tx, TypedTransaction::Eip1559(_)));
        assert!(tx.to().is_some());
        assert_eq!(tx.gas(), Some(&U256::from(TRANSFER_GAS_LIMIT)));
        assert_eq!(tx.value(), Some(&U256::from(10u64)));
    }

    #[test]
    fn bad_bytecode_and_address_are_template_errors() {
        assert!(matches!(
            TxTemplate::contract_creation("0xzz", 21_000, U256::zero()),
            Err(DeployError::Template(_))
        ));
        assert!(matches!(
            TxTemplate::contract_creation("", 21_000, U256::zero()),
            Err(DeployError::Template(_))
        ));
        assert!(matches!(
            TxTemplate::transfer("not-an-address", U256::zero()),
            Err(DeployError::Template(_))
        ));
    }

    #[test]
    fn bytecode_accepts_optional_prefix() {
        let with = TxTemplate::contract_creation("0x6080", 100, U256::zero()).unwrap();
        let without = TxTemplate::contract_creation("6080", 100, U256::zero()).unwrap();
        match (with, without) {
            (
                TxTemplate::ContractCreation { bytecode: a, .. },
                TxTemplate::ContractCreation { bytecode: b, .. },
            ) => assert_eq!(a, b),
            _ => unreachable!(),
        }
    }
}
