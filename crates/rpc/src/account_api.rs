use ethers::types::{transaction::eip712::TypedData, Address, Bytes, U256};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use lightkit_client::UserOperationSubmission;
use lightkit_primitives::{
    CallData, UserOperationCallData, UserOperationHash, UserOperationOverrides,
    UserOperationReceipt, UserOperationRequest,
};

/// The `account` namespace RPC methods trait
#[rpc(server, client, namespace = "account")]
pub trait AccountApi {
    /// Address of the smart account (counterfactual until deployed).
    #[method(name = "getAddress")]
    async fn get_address(&self) -> RpcResult<Address>;

    /// Build a user operation executing `call_data` without signing or sending it.
    ///
    /// # Arguments
    /// * `call_data` - A single call, a batch of calls or already encoded call data.
    /// * `overrides` - Values pinned by the caller.
    ///
    /// # Returns
    /// * `RpcResult<UserOperationRequest>` - The user operation with the dummy signature.
    #[method(name = "buildUserOperation")]
    async fn build_user_operation(
        &self,
        call_data: UserOperationCallData,
        overrides: Option<UserOperationOverrides>,
    ) -> RpcResult<UserOperationRequest>;

    /// Build, sign and send a user operation executing `call_data`.
    #[method(name = "sendUserOperation")]
    async fn send_user_operation(
        &self,
        call_data: UserOperationCallData,
        overrides: Option<UserOperationOverrides>,
    ) -> RpcResult<UserOperationSubmission>;

    /// Wait until the user operation is mined.
    ///
    /// Fails with the dropped error code on timeout or when the bundler evicted the user
    /// operation. `nonce` only annotates the error.
    #[method(name = "waitForUserOperationTransaction")]
    async fn wait_for_user_operation_transaction(
        &self,
        user_operation_hash: UserOperationHash,
        nonce: Option<U256>,
    ) -> RpcResult<UserOperationReceipt>;

    /// Supersede a stuck user operation with one with the same nonce and bumped fees.
    #[method(name = "dropAndReplaceUserOperation")]
    async fn drop_and_replace_user_operation(
        &self,
        user_operation: UserOperationRequest,
        overrides: Option<UserOperationOverrides>,
    ) -> RpcResult<UserOperationSubmission>;

    /// ERC-1271 signature of `message`, ERC-6492 wrapped while the account isn't deployed.
    #[method(name = "signMessage")]
    async fn sign_message(&self, message: Bytes) -> RpcResult<Bytes>;

    /// ERC-6492 wrapped ERC-1271 signature of `message`.
    #[method(name = "signMessageWith6492")]
    async fn sign_message_with_6492(&self, message: Bytes) -> RpcResult<Bytes>;

    /// ERC-1271 signature of EIP-712 `typed_data`, ERC-6492 wrapped while the account isn't
    /// deployed.
    #[method(name = "signTypedData")]
    async fn sign_typed_data(&self, typed_data: TypedData) -> RpcResult<Bytes>;

    #[method(name = "signTypedDataWith6492")]
    async fn sign_typed_data_with_6492(&self, typed_data: TypedData) -> RpcResult<Bytes>;

    #[method(name = "encodeTransferOwnership")]
    async fn encode_transfer_ownership(&self, new_owner: Address) -> RpcResult<Bytes>;

    #[method(name = "encodeBatchExecute")]
    async fn encode_batch_execute(&self, calls: Vec<CallData>) -> RpcResult<Bytes>;
}
