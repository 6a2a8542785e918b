//! Calls executed by the smart account

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// A single call from the account to `target`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallData {
    pub target: Address,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

impl CallData {
    pub fn new(target: Address, data: Bytes) -> Self {
        Self { target, data, value: None }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

/// What a user operation executes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserOperationCallData {
    /// One call (`execute`)
    Single(CallData),
    /// Ordered calls (`executeBatch`)
    Batch(Vec<CallData>),
    /// Call data already encoded by the caller
    Raw(Bytes),
}

impl From<CallData> for UserOperationCallData {
    fn from(value: CallData) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<CallData>> for UserOperationCallData {
    fn from(value: Vec<CallData>) -> Self {
        Self::Batch(value)
    }
}
