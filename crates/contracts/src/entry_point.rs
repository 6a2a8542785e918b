use crate::{
    error::{decode_revert, EntryPointError},
    gen::{
        entry_point_api::{EntryPointAPIErrors, SenderAddressResult},
        EntryPointAPI,
    },
};
use ethers::{
    prelude::ContractError,
    providers::Middleware,
    types::{Address, Bytes, U256},
};
use std::sync::Arc;
use tracing::trace;

/// Entry point reads needed to build user operations
#[derive(Clone)]
pub struct EntryPoint<M: Middleware + 'static> {
    address: Address,
    api: EntryPointAPI<M>,
}

impl<M: Middleware + 'static> EntryPoint<M> {
    pub fn new(eth_client: Arc<M>, address: Address) -> Self {
        Self { address, api: EntryPointAPI::new(address, eth_client) }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn decode_contract_error(
        err: ContractError<M>,
    ) -> Result<EntryPointAPIErrors, EntryPointError> {
        match err {
            ContractError::Revert(data) => decode_revert(data),
            ContractError::MiddlewareError { e } => EntryPointError::from_middleware_error::<M>(e),
            ContractError::ProviderError { e } => EntryPointError::from_provider_error(&e),
            ContractError::DecodingError(e) => {
                Err(EntryPointError::Decode { message: e.to_string() })
            }
            ContractError::AbiError(e) => Err(EntryPointError::Decode { message: e.to_string() }),
            _ => Err(EntryPointError::Other { message: err.to_string() }),
        }
    }

    /// Nonce of `address` in the `key` namespace (the key is already in the high-order bits)
    pub async fn get_nonce(&self, address: &Address, key: U256) -> Result<U256, EntryPointError> {
        trace!("Reading nonce of {address:?} with key 0x{key:x}");
        self.api
            .get_nonce(*address, key)
            .call()
            .await
            .map_err(|err| EntryPointError::Other { message: format!("get nonce error: {err}") })
    }

    /// Counterfactual address of the account created by `init_code`
    ///
    /// `getSenderAddress` always reverts, the address comes back in `SenderAddressResult`.
    pub async fn get_sender_address(
        &self,
        init_code: Bytes,
    ) -> Result<SenderAddressResult, EntryPointError> {
        let err = match self.api.get_sender_address(init_code).call().await {
            Ok(_) => {
                return Err(EntryPointError::NoRevert { function: "getSenderAddress".into() })
            }
            Err(err) => err,
        };

        match Self::decode_contract_error(err)? {
            EntryPointAPIErrors::SenderAddressResult(res) => Ok(res),
            EntryPointAPIErrors::FailedOp(op) => Err(EntryPointError::FailedOp(op)),
            other => Err(EntryPointError::Other {
                message: format!("unexpected getSenderAddress revert: {other:?}"),
            }),
        }
    }
}
