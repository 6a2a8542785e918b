//! Bundler and paymaster JSON-RPC calls

use ethers::{
    providers::{Middleware, ProviderError},
    types::{Address, Bytes, U256},
};
use lightkit_primitives::{
    utils::{pack_paymaster_data, unpack_paymaster_data},
    RpcUserOperation, UserOperationGasEstimation, UserOperationHash,
    UserOperationReceipt,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};
use tracing::trace;

/// Paymaster fields returned by ERC-7677 and vendor sponsors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterResponse {
    /// Entry point v0.6 form
    #[serde(default)]
    pub paymaster_and_data: Option<Bytes>,
    /// Entry point v0.7 form
    #[serde(default)]
    pub paymaster: Option<Address>,
    #[serde(default)]
    pub paymaster_data: Option<Bytes>,
    #[serde(default)]
    pub paymaster_verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: Option<U256>,
    /// The stub data is already the final sponsorship
    #[serde(default)]
    pub is_final: bool,
}

impl PaymasterResponse {
    /// `paymasterAndData` in the packed layout of the request
    pub fn paymaster_and_data(&self) -> Bytes {
        self.paymaster_and_data_over(&Bytes::default())
    }

    /// `paymasterAndData` of the reply packed over the `current` one
    ///
    /// Paymaster gas limits missing from a v0.7 reply are taken from `current`.
    pub fn paymaster_and_data_over(&self, current: &Bytes) -> Bytes {
        if let Some(ref paymaster_and_data) = self.paymaster_and_data {
            return paymaster_and_data.clone();
        }

        let Some(paymaster) = self.paymaster else {
            return Bytes::default();
        };
        let (_, verification_gas_limit, post_op_gas_limit, _) =
            unpack_paymaster_data(current).unwrap_or_default();
        pack_paymaster_data(
            paymaster,
            self.paymaster_verification_gas_limit.unwrap_or(verification_gas_limit),
            self.paymaster_post_op_gas_limit.unwrap_or(post_op_gas_limit),
            &self.paymaster_data.clone().unwrap_or_default(),
        )
    }
}

/// Reply of `alchemy_requestGasAndPaymasterAndData`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasAndPaymasterResponse {
    #[serde(flatten)]
    pub paymaster: PaymasterResponse,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Fee fields the vendor sponsor must not go below
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeOverrides {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GasAndPaymasterRequest<'a> {
    policy_id: &'a str,
    entry_point: Address,
    dummy_signature: Bytes,
    user_operation: RpcUserOperation,
    overrides: FeeOverrides,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseFee {
    base_fee_per_gas: Option<U256>,
}

type Erc7677Params = (RpcUserOperation, Address, String, serde_json::Value);

/// `[userOp, entryPoint, chainIdHex, context]`
fn erc7677_params(
    uo: RpcUserOperation,
    entry_point: Address,
    chain_id: u64,
    context: Option<serde_json::Value>,
) -> Erc7677Params {
    (uo, entry_point, format!("0x{chain_id:x}"), context.unwrap_or_else(|| serde_json::json!({})))
}

/// JSON-RPC calls to the bundler (and paymaster) endpoint
#[derive(Debug)]
pub struct BundlerClient<M: Middleware + 'static> {
    client: Arc<M>,
}

impl<M: Middleware + 'static> Clone for BundlerClient<M> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone() }
    }
}

impl<M: Middleware + 'static> BundlerClient<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, ProviderError>
    where
        T: Debug + Serialize + Send + Sync,
        R: Serialize + DeserializeOwned + Debug + Send,
    {
        trace!("Sending {method} request with {params:?}");
        self.client.provider().request(method, params).await
    }

    pub async fn estimate_user_operation_gas(
        &self,
        uo: RpcUserOperation,
        entry_point: Address,
    ) -> Result<UserOperationGasEstimation, ProviderError> {
        self.request("eth_estimateUserOperationGas", (uo, entry_point)).await
    }

    pub async fn send_user_operation(
        &self,
        uo: RpcUserOperation,
        entry_point: Address,
    ) -> Result<UserOperationHash, ProviderError> {
        self.request("eth_sendUserOperation", (uo, entry_point)).await
    }

    pub async fn get_user_operation_receipt(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, ProviderError> {
        self.request("eth_getUserOperationReceipt", [hash]).await
    }

    /// Pending or mined user operation, `None` once the bundler forgot about it
    pub async fn get_user_operation_by_hash(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Option<serde_json::Value>, ProviderError> {
        self.request("eth_getUserOperationByHash", [hash]).await
    }

    /// Base fee of the latest block
    pub async fn base_fee_per_gas(&self) -> Result<U256, ProviderError> {
        let block: Option<BaseFee> =
            self.request("eth_getBlockByNumber", ("latest", false)).await?;
        block
            .and_then(|block| block.base_fee_per_gas)
            .ok_or_else(|| ProviderError::CustomError("latest block has no base fee".into()))
    }

    pub async fn max_priority_fee_per_gas(&self, method: &str) -> Result<U256, ProviderError> {
        self.request(method, ()).await
    }

    /// ERC-7677 `pm_getPaymasterStubData`
    pub async fn get_paymaster_stub_data(
        &self,
        uo: RpcUserOperation,
        entry_point: Address,
        chain_id: u64,
        context: Option<serde_json::Value>,
    ) -> Result<PaymasterResponse, ProviderError> {
        let params = erc7677_params(uo, entry_point, chain_id, context);
        self.request("pm_getPaymasterStubData", params).await
    }

    /// ERC-7677 `pm_getPaymasterData`
    pub async fn get_paymaster_data(
        &self,
        uo: RpcUserOperation,
        entry_point: Address,
        chain_id: u64,
        context: Option<serde_json::Value>,
    ) -> Result<PaymasterResponse, ProviderError> {
        let params = erc7677_params(uo, entry_point, chain_id, context);
        self.request("pm_getPaymasterData", params).await
    }

    /// Gas limits, fees and paymaster data of a sponsored user operation
    pub async fn request_gas_and_paymaster_data(
        &self,
        policy_id: &str,
        entry_point: Address,
        dummy_signature: Bytes,
        uo: RpcUserOperation,
        overrides: FeeOverrides,
    ) -> Result<GasAndPaymasterResponse, ProviderError> {
        let request = GasAndPaymasterRequest {
            policy_id,
            entry_point,
            dummy_signature,
            user_operation: uo,
            overrides,
        };
        self.request("alchemy_requestGasAndPaymasterAndData", [request]).await
    }
}
