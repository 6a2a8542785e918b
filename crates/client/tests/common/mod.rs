#![allow(dead_code)]

use async_trait::async_trait;
use ethers::{
    abi::AbiEncode,
    providers::{JsonRpcClient, JsonRpcError, MockError, Provider},
    signers::LocalWallet,
    types::{Address, Bytes, U256},
};
use lightkit_client::{ClientConfig, SmartAccountClient, WaitConfig};
use lightkit_primitives::{AccountVersion, UserOperationRequest, UserOperationV07};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::{collections::HashMap, fmt::Debug, sync::Arc};

// anvil's first account
pub const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OWNER_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const ACCOUNT: &str = "0x9EfDfCB56390eDd8b2eAE6daBC148CED3491AAf6";
pub const PAYMASTER: &str = "0x8ba1f109551bd432803012645ac136ddd64dba72";

pub const GET_NONCE: &str = "0x35567e1a";
pub const OWNER: &str = "0x8da5cb5b";

/// Base fee 100 wei (+50% buffer) and priority fee 10 wei
pub const MAX_FEE_PER_GAS: u64 = 160;
pub const MAX_PRIORITY_FEE_PER_GAS: u64 = 10;

#[derive(Clone, Debug)]
pub struct Call {
    pub method: String,
    pub params: Value,
}

type Responder = Box<dyn Fn(&Value, &[Call]) -> Result<Value, JsonRpcError> + Send + Sync>;

#[derive(Default)]
struct Inner {
    calls: Mutex<Vec<Call>>,
    responders: Mutex<HashMap<String, Responder>>,
}

/// Node, bundler and paymaster answering by method name
///
/// Every method has a default answer, [FakeNode::on] replaces it. Clones share the same state.
#[derive(Clone, Default)]
pub struct FakeNode {
    inner: Arc<Inner>,
}

impl Debug for FakeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeNode").finish_non_exhaustive()
    }
}

pub fn rpc_error(code: i64, message: &str) -> JsonRpcError {
    JsonRpcError { code, message: message.into(), data: None }
}

pub fn word(value: impl AbiEncode) -> Value {
    json!(Bytes::from(value.encode()))
}

/// Selector of the `eth_call` in `params`
pub fn call_data(params: &Value) -> String {
    let tx = &params[0];
    tx.get("data").or_else(|| tx.get("input")).and_then(Value::as_str).unwrap_or("0x").into()
}

impl FakeNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method` with `responder` from now on
    pub fn on<F>(&self, method: &str, responder: F)
    where
        F: Fn(&Value, &[Call]) -> Result<Value, JsonRpcError> + Send + Sync + 'static,
    {
        self.inner.responders.lock().insert(method.into(), Box::new(responder));
    }

    /// Params of every call to `method`, oldest first
    pub fn calls(&self, method: &str) -> Vec<Value> {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .map(|call| call.params.clone())
            .collect()
    }

    /// Methods in call order
    pub fn methods(&self) -> Vec<String> {
        self.inner.calls.lock().iter().map(|call| call.method.clone()).collect()
    }

    /// User operations sent with `eth_sendUserOperation`
    pub fn sent(&self) -> Vec<UserOperationRequest> {
        self.calls("eth_sendUserOperation")
            .into_iter()
            .filter_map(|params| serde_json::from_value(params[0].clone()).ok())
            .collect()
    }

    /// Entry point v0.7 user operations sent with `eth_sendUserOperation`
    pub fn sent_v07(&self) -> Vec<UserOperationV07> {
        self.calls("eth_sendUserOperation")
            .into_iter()
            .filter_map(|params| serde_json::from_value(params[0].clone()).ok())
            .collect()
    }

    pub fn provider(&self) -> Arc<Provider<FakeNode>> {
        Arc::new(Provider::new(self.clone()))
    }

    fn respond(&self, method: &str, params: &Value) -> Result<Value, JsonRpcError> {
        let history = self.inner.calls.lock().clone();
        if let Some(responder) = self.inner.responders.lock().get(method) {
            return responder(params, &history);
        }

        match method {
            "eth_chainId" => Ok(json!("0x1")),
            "eth_getCode" => Ok(json!("0x")),
            "eth_call" => {
                let data = call_data(params);
                if data.starts_with(GET_NONCE) {
                    Ok(word(U256::zero()))
                } else if data.starts_with(OWNER) {
                    Ok(word(owner()))
                } else {
                    Err(rpc_error(3, "execution reverted"))
                }
            }
            "eth_getBlockByNumber" => Ok(json!({ "baseFeePerGas": "0x64" })),
            "eth_maxPriorityFeePerGas" | "rundler_maxPriorityFeePerGas" => Ok(json!("0xa")),
            "eth_estimateUserOperationGas" => Ok(json!({
                "preVerificationGas": "0xc350",
                "verificationGasLimit": "0x186a0",
                "callGasLimit": "0x7530"
            })),
            "eth_sendUserOperation" => Ok(json!(format!("0x{:064x}", history.len()))),
            "eth_getUserOperationReceipt" => Ok(receipt(&params[0])),
            "eth_getUserOperationByHash" => Ok(json!({ "userOperation": {} })),
            _ => Err(rpc_error(-32601, "method not found")),
        }
    }
}

#[async_trait]
impl JsonRpcClient for FakeNode {
    type Error = MockError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, Self::Error>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = serde_json::to_value(params)?;
        let res = self.respond(method, &params);
        self.inner.calls.lock().push(Call { method: method.into(), params });

        match res {
            Ok(value) => Ok(serde_json::from_value(value)?),
            Err(err) => Err(MockError::JsonRpcError(err)),
        }
    }
}

pub fn owner() -> Address {
    OWNER_ADDRESS.parse().unwrap_or_default()
}

pub fn receipt(hash: &Value) -> Value {
    json!({
        "userOpHash": hash,
        "sender": ACCOUNT,
        "nonce": "0x0",
        "actualGasCost": "0x1",
        "actualGasUsed": "0x1",
        "success": true,
        "reason": "",
        "receipt": {
            "transactionHash": format!("0x{:064x}", 1),
            "blockNumber": "0x1"
        }
    })
}

pub fn wait_config() -> WaitConfig {
    WaitConfig { timeout: 1_000, poll_interval: 10, interval_multiplier: 100 }
}

pub fn config() -> eyre::Result<ClientConfig> {
    Ok(ClientConfig {
        version: AccountVersion::V1_1_0,
        account_address: Some(ACCOUNT.parse()?),
        wait: wait_config(),
        ..Default::default()
    })
}

/// Counterfactual v2.0.0 account on entry point v0.7
pub fn config_v07() -> eyre::Result<ClientConfig> {
    Ok(ClientConfig { version: AccountVersion::V2_0_0, account_address: None, ..config()? })
}

pub async fn client(
    node: &FakeNode,
    config: ClientConfig,
) -> eyre::Result<SmartAccountClient<Provider<FakeNode>, LocalWallet>> {
    let wallet = OWNER_KEY.parse::<LocalWallet>()?;
    Ok(SmartAccountClient::new(node.provider(), wallet, config).await?)
}
