//! User operation as sent to bundlers and paymasters

use super::UserOperationRequest;
use crate::utils::{
    as_checksum_addr, as_checksum_addr_opt, pack_factory_data, pack_paymaster_data,
    unpack_factory_data, unpack_paymaster_data,
};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Entry point v0.7 user operation (unpacked factory and paymaster fields)
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationV07 {
    #[serde(serialize_with = "as_checksum_addr")]
    pub sender: Address,
    pub nonce: U256,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub factory: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory_data: Option<Bytes>,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "as_checksum_addr_opt"
    )]
    pub paymaster: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_post_op_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_data: Option<Bytes>,
    pub signature: Bytes,
}

impl From<&UserOperationRequest> for UserOperationV07 {
    fn from(value: &UserOperationRequest) -> Self {
        let (factory, factory_data) = unpack_factory_data(&value.init_code).unzip();
        let (paymaster, paymaster_verification_gas_limit, paymaster_post_op_gas_limit, paymaster_data) =
            match unpack_paymaster_data(&value.paymaster_and_data) {
                Some((paymaster, verification, post_op, data)) => {
                    (Some(paymaster), Some(verification), Some(post_op), Some(data))
                }
                None => (None, None, None, None),
            };
        Self {
            sender: value.sender,
            nonce: value.nonce,
            factory,
            factory_data,
            call_data: value.call_data.clone(),
            call_gas_limit: value.call_gas_limit,
            verification_gas_limit: value.verification_gas_limit,
            pre_verification_gas: value.pre_verification_gas,
            max_fee_per_gas: value.max_fee_per_gas,
            max_priority_fee_per_gas: value.max_priority_fee_per_gas,
            paymaster,
            paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit,
            paymaster_data,
            signature: value.signature.clone(),
        }
    }
}

impl From<UserOperationV07> for UserOperationRequest {
    fn from(value: UserOperationV07) -> Self {
        let init_code = match value.factory {
            Some(factory) => pack_factory_data(factory, &value.factory_data.unwrap_or_default()),
            None => Bytes::default(),
        };
        let paymaster_and_data = match value.paymaster {
            Some(paymaster) => pack_paymaster_data(
                paymaster,
                value.paymaster_verification_gas_limit.unwrap_or_default(),
                value.paymaster_post_op_gas_limit.unwrap_or_default(),
                &value.paymaster_data.unwrap_or_default(),
            ),
            None => Bytes::default(),
        };
        Self {
            sender: value.sender,
            nonce: value.nonce,
            init_code,
            call_data: value.call_data,
            call_gas_limit: value.call_gas_limit,
            verification_gas_limit: value.verification_gas_limit,
            pre_verification_gas: value.pre_verification_gas,
            max_fee_per_gas: value.max_fee_per_gas,
            max_priority_fee_per_gas: value.max_priority_fee_per_gas,
            paymaster_and_data,
            signature: value.signature,
        }
    }
}

/// User operation in the layout of the target entry point version
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RpcUserOperation {
    V0_6(UserOperationRequest),
    V0_7(UserOperationV07),
}

impl From<RpcUserOperation> for UserOperationRequest {
    fn from(value: RpcUserOperation) -> Self {
        match value {
            RpcUserOperation::V0_6(uo) => uo,
            RpcUserOperation::V0_7(uo) => uo.into(),
        }
    }
}
