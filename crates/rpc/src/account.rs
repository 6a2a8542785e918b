use crate::{account_api::AccountApiServer, error::JsonRpcError};
use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    signers::Signer,
    types::{transaction::eip712::TypedData, Address, Bytes, U256},
};
use jsonrpsee::core::RpcResult;
use lightkit_client::{SmartAccountClient, UserOperationSubmission};
use lightkit_primitives::{
    CallData, UserOperationCallData, UserOperationHash, UserOperationOverrides,
    UserOperationReceipt, UserOperationRequest,
};
use std::sync::Arc;
use tracing::trace;

/// AccountApiServerImpl implements the account namespace on top of one smart account client
pub struct AccountApiServerImpl<M: Middleware + 'static, S: Signer + 'static> {
    pub client: Arc<SmartAccountClient<M, S>>,
}

impl<M: Middleware + 'static, S: Signer + 'static> AccountApiServerImpl<M, S> {
    pub fn new(client: Arc<SmartAccountClient<M, S>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<M: Middleware + 'static, S: Signer + 'static> AccountApiServer for AccountApiServerImpl<M, S> {
    async fn get_address(&self) -> RpcResult<Address> {
        Ok(self.client.address())
    }

    async fn build_user_operation(
        &self,
        call_data: UserOperationCallData,
        overrides: Option<UserOperationOverrides>,
    ) -> RpcResult<UserOperationRequest> {
        trace!("Building user operation for {call_data:?}");
        Ok(self
            .client
            .build_user_operation(&call_data, &overrides.unwrap_or_default())
            .await
            .map_err(JsonRpcError::from)?)
    }

    async fn send_user_operation(
        &self,
        call_data: UserOperationCallData,
        overrides: Option<UserOperationOverrides>,
    ) -> RpcResult<UserOperationSubmission> {
        trace!("Sending user operation for {call_data:?}");
        Ok(self
            .client
            .send_user_operation(&call_data, &overrides.unwrap_or_default())
            .await
            .map_err(JsonRpcError::from)?)
    }

    async fn wait_for_user_operation_transaction(
        &self,
        user_operation_hash: UserOperationHash,
        nonce: Option<U256>,
    ) -> RpcResult<UserOperationReceipt> {
        Ok(self
            .client
            .wait_for_user_operation_transaction(&user_operation_hash, nonce.unwrap_or_default())
            .await
            .map_err(JsonRpcError::from)?)
    }

    async fn drop_and_replace_user_operation(
        &self,
        user_operation: UserOperationRequest,
        overrides: Option<UserOperationOverrides>,
    ) -> RpcResult<UserOperationSubmission> {
        Ok(self
            .client
            .drop_and_replace_user_operation(&user_operation, &overrides.unwrap_or_default())
            .await
            .map_err(JsonRpcError::from)?)
    }

    async fn sign_message(&self, message: Bytes) -> RpcResult<Bytes> {
        Ok(self.client.sign_message(message).await.map_err(JsonRpcError::from)?)
    }

    async fn sign_message_with_6492(&self, message: Bytes) -> RpcResult<Bytes> {
        Ok(self.client.sign_message_with_6492(message).await.map_err(JsonRpcError::from)?)
    }

    async fn sign_typed_data(&self, typed_data: TypedData) -> RpcResult<Bytes> {
        Ok(self.client.sign_typed_data(&typed_data).await.map_err(JsonRpcError::from)?)
    }

    async fn sign_typed_data_with_6492(&self, typed_data: TypedData) -> RpcResult<Bytes> {
        Ok(self
            .client
            .sign_typed_data_with_6492(&typed_data)
            .await
            .map_err(JsonRpcError::from)?)
    }

    async fn encode_transfer_ownership(&self, new_owner: Address) -> RpcResult<Bytes> {
        Ok(self.client.account().encode_transfer_ownership(new_owner))
    }

    async fn encode_batch_execute(&self, calls: Vec<CallData>) -> RpcResult<Bytes> {
        Ok(self.client.account().encode_batch_execute(&calls).map_err(JsonRpcError::from)?)
    }
}
