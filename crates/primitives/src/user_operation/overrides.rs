use super::UserOperationRequest;
use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};

/// Caller-pinned values of a user operation
///
/// A pinned field always ends up in the built user operation unchanged, and a middleware stage
/// whose fields are all pinned doesn't run.
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_gas_limit: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_verification_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    /// Any value (including `0x`) opts out of the paymaster stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster_and_data: Option<Bytes>,
    /// Key placed in the 192 high-order bits of the nonce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce_key: Option<U256>,
    /// Full nonce, takes precedence over `nonce_key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
}

impl UserOperationOverrides {
    /// Whether the caller opted out of paymaster sponsorship
    pub fn bypass_paymaster(&self) -> bool {
        self.paymaster_and_data.is_some()
    }

    /// Whether all gas limits are pinned
    pub fn gas_pinned(&self) -> bool {
        self.call_gas_limit.is_some()
            && self.verification_gas_limit.is_some()
            && self.pre_verification_gas.is_some()
    }

    /// Whether both fee fields are pinned
    pub fn fees_pinned(&self) -> bool {
        self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
    }

    /// Writes every pinned field into the user operation
    pub fn apply(&self, uo: &mut UserOperationRequest) {
        if let Some(nonce) = self.nonce {
            uo.nonce = nonce;
        }
        if let Some(call_gas_limit) = self.call_gas_limit {
            uo.call_gas_limit = call_gas_limit;
        }
        if let Some(verification_gas_limit) = self.verification_gas_limit {
            uo.verification_gas_limit = verification_gas_limit;
        }
        if let Some(pre_verification_gas) = self.pre_verification_gas {
            uo.pre_verification_gas = pre_verification_gas;
        }
        if let Some(max_fee_per_gas) = self.max_fee_per_gas {
            uo.max_fee_per_gas = max_fee_per_gas;
        }
        if let Some(max_priority_fee_per_gas) = self.max_priority_fee_per_gas {
            uo.max_priority_fee_per_gas = max_priority_fee_per_gas;
        }
        if let Some(ref paymaster_and_data) = self.paymaster_and_data {
            uo.paymaster_and_data = paymaster_and_data.clone();
        }
    }

    // Builder pattern helpers

    pub fn call_gas_limit(mut self, call_gas_limit: U256) -> Self {
        self.call_gas_limit = Some(call_gas_limit);
        self
    }

    pub fn verification_gas_limit(mut self, verification_gas_limit: U256) -> Self {
        self.verification_gas_limit = Some(verification_gas_limit);
        self
    }

    pub fn pre_verification_gas(mut self, pre_verification_gas: U256) -> Self {
        self.pre_verification_gas = Some(pre_verification_gas);
        self
    }

    pub fn max_fee_per_gas(mut self, max_fee_per_gas: U256) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: U256) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub fn paymaster_and_data(mut self, paymaster_and_data: Bytes) -> Self {
        self.paymaster_and_data = Some(paymaster_and_data);
        self
    }

    pub fn nonce_key(mut self, nonce_key: U256) -> Self {
        self.nonce_key = Some(nonce_key);
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }
}
