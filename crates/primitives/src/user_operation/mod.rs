//! User operation (account abstraction (ERC-4337) transaction) as built by the client

mod hash;
mod overrides;
mod receipt;
mod wire;

use crate::{
    entry_point::EntryPointVersion,
    utils::{as_checksum_addr, pack_uint128},
};
use ethers::{
    abi::AbiEncode,
    contract::{EthAbiCodec, EthAbiType},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
pub use hash::UserOperationHash;
pub use overrides::UserOperationOverrides;
pub use receipt::{TransactionSummary, UserOperationGasEstimation, UserOperationReceipt};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
pub use wire::{RpcUserOperation, UserOperationV07};

/// User operation before submission
///
/// The request keeps the entry point v0.6 field layout. For entry point v0.7 `init_code` is
/// `factory ++ factoryData` and `paymaster_and_data` is the packed v0.7 layout (paymaster,
/// verification gas limit, post-op gas limit, paymaster data); [RpcUserOperation] splits them
/// when the request is sent over the wire.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationRequest {
    /// Sender of the user operation (the smart account)
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,

    /// Nonce (192-bit key followed by 64-bit sequence)
    #[serde(default)]
    pub nonce: U256,

    /// Factory address followed by the factory call (empty once the account is deployed)
    #[serde(default)]
    pub init_code: Bytes,

    /// The data that is passed to the sender during the main execution call
    #[serde(default)]
    pub call_data: Bytes,

    /// The amount of gas to allocate for the main execution call
    #[serde(default)]
    pub call_gas_limit: U256,

    /// The amount of gas to allocate for the verification step
    #[serde(default)]
    pub verification_gas_limit: U256,

    /// The amount of gas to pay bundler to compensate for the pre-verification execution and
    /// calldata
    #[serde(default)]
    pub pre_verification_gas: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    #[serde(default)]
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas (similar to EIP-1559)
    #[serde(default)]
    pub max_priority_fee_per_gas: U256,

    /// Address of paymaster sponsoring the user operation, followed by extra data to send to the
    /// paymaster (can be empty)
    #[serde(default)]
    pub paymaster_and_data: Bytes,

    /// Data passed to the account along with the nonce during the verification step
    #[serde(default)]
    pub signature: Bytes,
}

/// Entry point v0.6 user operation without signature (helper for hashing)
#[derive(EthAbiCodec, EthAbiType)]
struct UserOperationNoSignature {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: H256,
    pub call_data: H256,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster_and_data: H256,
}

/// Entry point v0.7 packed user operation without signature (helper for hashing)
#[derive(EthAbiCodec, EthAbiType)]
struct PackedUserOperationNoSignature {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: H256,
    pub call_data: H256,
    pub account_gas_limits: H256,
    pub pre_verification_gas: U256,
    pub gas_fees: H256,
    pub paymaster_and_data: H256,
}

impl From<&UserOperationRequest> for UserOperationNoSignature {
    fn from(value: &UserOperationRequest) -> Self {
        Self {
            sender: value.sender,
            nonce: value.nonce,
            init_code: keccak256(value.init_code.deref()).into(),
            call_data: keccak256(value.call_data.deref()).into(),
            call_gas_limit: value.call_gas_limit,
            verification_gas_limit: value.verification_gas_limit,
            pre_verification_gas: value.pre_verification_gas,
            max_fee_per_gas: value.max_fee_per_gas,
            max_priority_fee_per_gas: value.max_priority_fee_per_gas,
            paymaster_and_data: keccak256(value.paymaster_and_data.deref()).into(),
        }
    }
}

impl From<&UserOperationRequest> for PackedUserOperationNoSignature {
    fn from(value: &UserOperationRequest) -> Self {
        Self {
            sender: value.sender,
            nonce: value.nonce,
            init_code: keccak256(value.init_code.deref()).into(),
            call_data: keccak256(value.call_data.deref()).into(),
            account_gas_limits: pack_uint128(value.verification_gas_limit, value.call_gas_limit)
                .into(),
            pre_verification_gas: value.pre_verification_gas,
            gas_fees: pack_uint128(value.max_priority_fee_per_gas, value.max_fee_per_gas).into(),
            paymaster_and_data: keccak256(value.paymaster_and_data.deref()).into(),
        }
    }
}

impl UserOperationRequest {
    /// Packs the user operation without signature (used for calculating the hash)
    pub fn pack_without_signature(&self, entry_point_version: EntryPointVersion) -> Bytes {
        match entry_point_version {
            EntryPointVersion::V0_6 => UserOperationNoSignature::from(self).encode().into(),
            EntryPointVersion::V0_7 => PackedUserOperationNoSignature::from(self).encode().into(),
        }
    }

    /// Calculates the hash of the user operation (the value signed by the owner)
    pub fn hash(
        &self,
        entry_point_version: EntryPointVersion,
        entry_point: &Address,
        chain_id: u64,
    ) -> UserOperationHash {
        H256::from_slice(
            keccak256(
                [
                    keccak256(self.pack_without_signature(entry_point_version).deref()).to_vec(),
                    entry_point.encode(),
                    U256::from(chain_id).encode(),
                ]
                .concat(),
            )
            .as_slice(),
        )
        .into()
    }

    /// Wire representation expected by bundlers of the given entry point version
    pub fn to_rpc(&self, entry_point_version: EntryPointVersion) -> RpcUserOperation {
        match entry_point_version {
            EntryPointVersion::V0_6 => RpcUserOperation::V0_6(self.clone()),
            EntryPointVersion::V0_7 => RpcUserOperation::V0_7(UserOperationV07::from(self)),
        }
    }

    /// Sets the signature
    pub fn signature(mut self, signature: Bytes) -> Self {
        self.signature = signature;
        self
    }
}
