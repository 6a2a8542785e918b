use super::UserOperationHash;
use crate::utils::as_checksum_addr;
use ethers::types::{Address, H256, U256, U64};
use serde::{Deserialize, Serialize};

/// Gas estimation returned by `eth_estimateUserOperationGas`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationGasEstimation {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,
    /// Only returned for entry point v0.7
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
}

/// Transaction that included the user operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub transaction_hash: H256,
    #[serde(default)]
    pub block_hash: Option<H256>,
    #[serde(default)]
    pub block_number: Option<U64>,
}

/// Receipt returned by `eth_getUserOperationReceipt`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: UserOperationHash,
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    pub nonce: U256,
    #[serde(default)]
    pub paymaster: Option<Address>,
    pub actual_gas_cost: U256,
    pub actual_gas_used: U256,
    pub success: bool,
    #[serde(default)]
    pub reason: String,
    pub receipt: TransactionSummary,
}
