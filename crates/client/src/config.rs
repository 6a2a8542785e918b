//! Client configuration

use ethers::types::{Address, U256};
use lightkit_primitives::{
    constants::{
        fees::BASE_FEE_BUFFER_PERC,
        wait::{INTERVAL_MULTIPLIER_PERC, POLL_INTERVAL_MS, TIMEOUT_MS},
    },
    AccountVersion,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How user operations get sponsored
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PaymasterMode {
    /// The account pays for its user operations
    #[default]
    None,
    /// `pm_getPaymasterStubData` / `pm_getPaymasterData`
    Erc7677 {
        /// Sponsor-specific context passed along with every paymaster call
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
    },
    /// `alchemy_requestGasAndPaymasterAndData` (gas limits, fees and sponsorship in one call)
    Vendor {
        #[serde(rename = "policyId")]
        policy_id: String,
    },
}

/// RPC method returning the priority fee
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityFeeSource {
    #[default]
    #[serde(rename = "eth_maxPriorityFeePerGas")]
    Node,
    #[serde(rename = "rundler_maxPriorityFeePerGas")]
    Rundler,
}

impl PriorityFeeSource {
    pub fn method(&self) -> &'static str {
        match self {
            PriorityFeeSource::Node => "eth_maxPriorityFeePerGas",
            PriorityFeeSource::Rundler => "rundler_maxPriorityFeePerGas",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeOptions {
    /// Added on top of the latest base fee (in percent)
    pub base_fee_buffer_percent: u64,
    /// Added on top of the reported priority fee (in percent)
    pub priority_fee_buffer_percent: u64,
    pub priority_fee_source: PriorityFeeSource,
}

impl Default for FeeOptions {
    fn default() -> Self {
        Self {
            base_fee_buffer_percent: BASE_FEE_BUFFER_PERC,
            priority_fee_buffer_percent: 0,
            priority_fee_source: PriorityFeeSource::default(),
        }
    }
}

/// Receipt polling, all durations in milliseconds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaitConfig {
    pub timeout: u64,
    pub poll_interval: u64,
    /// Growth of the polling interval after each miss (in percent, 100 keeps it constant)
    pub interval_multiplier: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: TIMEOUT_MS,
            poll_interval: POLL_INTERVAL_MS,
            interval_multiplier: INTERVAL_MULTIPLIER_PERC,
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    /// Interval following `interval`, growth stops at the timeout
    pub fn next_interval(&self, interval: Duration) -> Duration {
        let multiplier = u32::try_from(self.interval_multiplier.max(100)).unwrap_or(u32::MAX);
        interval
            .checked_mul(multiplier)
            .map_or(Duration::MAX, |grown| grown / 100)
            .min(self.timeout().max(interval))
    }
}

/// Smart account client configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub version: AccountVersion,
    /// Account to operate, derived from the owner when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_address: Option<Address>,
    #[serde(default)]
    pub salt: U256,
    #[serde(default)]
    pub paymaster: PaymasterMode,
    #[serde(default)]
    pub fee_options: FeeOptions,
    #[serde(default)]
    pub wait: WaitConfig,
}
