use crate::{
    bundler::BundlerClient,
    config::{ClientConfig, PaymasterMode},
    error::ClientError,
    middleware::{
        estimate_fees, Erc7677DataMiddleware, Erc7677StubMiddleware, FeeEstimatorMiddleware,
        GasEstimatorMiddleware, MiddlewareContext, MiddlewarePipeline, NonceMiddleware,
        VendorPaymasterMiddleware,
    },
    submission::{wait_for_receipt, SubmissionState, UserOperationSubmission},
};
use ethers::{
    providers::Middleware,
    signers::Signer,
    types::{transaction::eip712::TypedData, Address, Bytes, U256},
};
use lightkit_account::SmartAccount;
use lightkit_primitives::{
    constants::fees::GAS_INCREASE_PERC, utils::increase_by_percent, CallData,
    UserOperationCallData, UserOperationHash, UserOperationOverrides, UserOperationReceipt,
    UserOperationRequest,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds, signs and submits user operations of one LightAccount
pub struct SmartAccountClient<M: Middleware + 'static, S: Signer> {
    account: SmartAccount<M, S>,
    bundler: BundlerClient<M>,
    config: ClientConfig,
}

impl<M: Middleware + 'static, S: Signer> SmartAccountClient<M, S> {
    /// Creates the account described by `config` (node, bundler and paymaster share `eth_client`)
    pub async fn new(
        eth_client: Arc<M>,
        signer: S,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let account = SmartAccount::create(
            eth_client,
            signer,
            config.version,
            config.account_address,
            config.salt,
        )
        .await?;
        Ok(Self::from_account(account, config))
    }

    pub fn from_account(account: SmartAccount<M, S>, config: ClientConfig) -> Self {
        let bundler = BundlerClient::new(account.eth_client());
        Self { account, bundler, config }
    }

    /// Sends bundler and paymaster requests to a dedicated endpoint
    pub fn with_bundler(mut self, bundler: Arc<M>) -> Self {
        self.bundler = BundlerClient::new(bundler);
        self
    }

    pub fn account(&self) -> &SmartAccount<M, S> {
        &self.account
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Stages populating a user operation built with `overrides`
    pub fn pipeline(&self, overrides: &UserOperationOverrides) -> MiddlewarePipeline<M, S> {
        let pipeline = MiddlewarePipeline::new().with_stage(NonceMiddleware);

        if overrides.bypass_paymaster() {
            return pipeline.with_stage(GasEstimatorMiddleware).with_stage(FeeEstimatorMiddleware);
        }

        match self.config.paymaster {
            PaymasterMode::None => {
                pipeline.with_stage(GasEstimatorMiddleware).with_stage(FeeEstimatorMiddleware)
            }
            PaymasterMode::Erc7677 { ref context } => pipeline
                .with_stage(Erc7677StubMiddleware { context: context.clone() })
                .with_stage(GasEstimatorMiddleware)
                .with_stage(FeeEstimatorMiddleware)
                .with_stage(Erc7677DataMiddleware { context: context.clone() }),
            PaymasterMode::Vendor { ref policy_id } => pipeline
                .with_stage(FeeEstimatorMiddleware)
                .with_stage(VendorPaymasterMiddleware { policy_id: policy_id.clone() }),
        }
    }

    async fn build_from_call_data(
        &self,
        call_data: Bytes,
        overrides: &UserOperationOverrides,
    ) -> Result<UserOperationRequest, ClientError> {
        let uo = UserOperationRequest {
            sender: self.account.address(),
            init_code: self.account.init_code().await?,
            call_data,
            signature: self.account.dummy_signature(),
            ..Default::default()
        };

        let mut ctx = MiddlewareContext::new(&self.account, &self.bundler, &self.config, overrides);
        let uo = self.pipeline(overrides).run(uo, &mut ctx).await?;
        debug!("Built user operation {uo:?}");
        Ok(uo)
    }

    /// Unsigned user operation (with the dummy signature) executing `call_data`
    pub async fn build_user_operation(
        &self,
        call_data: &UserOperationCallData,
        overrides: &UserOperationOverrides,
    ) -> Result<UserOperationRequest, ClientError> {
        let call_data = self.account.encode_call_data(call_data)?;
        self.build_from_call_data(call_data, overrides).await
    }

    pub fn user_operation_hash(&self, uo: &UserOperationRequest) -> UserOperationHash {
        let descriptor = self.account.descriptor();
        uo.hash(
            descriptor.entry_point,
            &descriptor.entry_point_address(),
            self.account.chain_id(),
        )
    }

    /// Replaces the signature of `uo` with the owner's signature
    pub async fn sign_user_operation(
        &self,
        uo: UserOperationRequest,
    ) -> Result<UserOperationSubmission, ClientError> {
        let hash = self.user_operation_hash(&uo);
        let signature = self.account.sign_user_operation_hash(&hash).await?;
        Ok(UserOperationSubmission::built(hash, uo.signature(signature)))
    }

    /// Sends a signed user operation to the bundler
    pub async fn submit(
        &self,
        mut submission: UserOperationSubmission,
    ) -> Result<UserOperationSubmission, ClientError> {
        let descriptor = self.account.descriptor();
        let hash = self
            .bundler
            .send_user_operation(
                submission.request.to_rpc(descriptor.entry_point),
                descriptor.entry_point_address(),
            )
            .await
            .map_err(|err| ClientError::rejected(&err, submission.nonce()))?;

        if hash != submission.hash {
            warn!("Bundler returned hash {hash} for user operation {}", submission.hash);
        }
        info!("User operation {} sent (nonce 0x{:x})", submission.hash, submission.nonce());
        submission.transition(SubmissionState::Submitted);
        Ok(submission)
    }

    /// Builds, signs and sends a user operation
    pub async fn send_user_operation(
        &self,
        call_data: &UserOperationCallData,
        overrides: &UserOperationOverrides,
    ) -> Result<UserOperationSubmission, ClientError> {
        let uo = self.build_user_operation(call_data, overrides).await?;
        let submission = self.sign_user_operation(uo).await?;
        self.submit(submission).await
    }

    /// Receipt of a submitted user operation, see [wait_for_receipt]
    pub async fn wait_for_user_operation_transaction(
        &self,
        hash: &UserOperationHash,
        nonce: U256,
    ) -> Result<UserOperationReceipt, ClientError> {
        wait_for_receipt(&self.bundler, hash, nonce, &self.config.wait).await
    }

    /// Waits for `submission` and records the outcome in its state
    pub async fn wait(
        &self,
        submission: &mut UserOperationSubmission,
    ) -> Result<UserOperationReceipt, ClientError> {
        match self.wait_for_user_operation_transaction(&submission.hash, submission.nonce()).await {
            Ok(receipt) => {
                submission.confirm(receipt.clone());
                Ok(receipt)
            }
            Err(err) => {
                if err.is_dropped() {
                    submission.transition(SubmissionState::Dropped);
                }
                Err(err)
            }
        }
    }

    /// Supersedes a stuck user operation
    ///
    /// The replacement executes the same call data with the same nonce, its fees are the larger
    /// of a fresh estimate and the stale fees bumped by 10%, so its hash differs from the stale
    /// one.
    pub async fn drop_and_replace_user_operation(
        &self,
        stale: &UserOperationRequest,
        overrides: &UserOperationOverrides,
    ) -> Result<UserOperationSubmission, ClientError> {
        let (max_fee_per_gas, max_priority_fee_per_gas) =
            estimate_fees(&self.bundler, &self.config.fee_options, None)
                .await
                .map_err(|message| ClientError::stage("fee-estimator", stale.nonce, message))?;

        let bumped_max_fee = increase_by_percent(stale.max_fee_per_gas, GAS_INCREASE_PERC);
        let bumped_priority_fee =
            increase_by_percent(stale.max_priority_fee_per_gas, GAS_INCREASE_PERC);

        let overrides = UserOperationOverrides {
            nonce: Some(stale.nonce),
            max_fee_per_gas: Some(max_fee_per_gas.max(bumped_max_fee)),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas.max(bumped_priority_fee)),
            ..overrides.clone()
        };

        let stale_hash = self.user_operation_hash(stale);
        info!("Replacing user operation {stale_hash} (nonce 0x{:x})", stale.nonce);

        let uo = self.build_from_call_data(stale.call_data.clone(), &overrides).await?;
        let mut submission = self.sign_user_operation(uo).await?;
        submission.replaces = Some(stale_hash);
        self.submit(submission).await
    }

    /// Sends, waits, and on a drop replaces the user operation once when `replace_on_drop` is set
    pub async fn send_and_wait(
        &self,
        call_data: &UserOperationCallData,
        overrides: &UserOperationOverrides,
        replace_on_drop: bool,
    ) -> Result<UserOperationSubmission, ClientError> {
        let mut submission = self.send_user_operation(call_data, overrides).await?;
        match self.wait(&mut submission).await {
            Ok(_) => Ok(submission),
            Err(err) if err.is_dropped() && replace_on_drop => {
                warn!("{err}, replacing it");
                let mut replacement =
                    self.drop_and_replace_user_operation(&submission.request, overrides).await?;
                self.wait(&mut replacement).await?;
                Ok(replacement)
            }
            Err(err) => Err(err),
        }
    }

    /// ERC-1271 signature, wrapped in an ERC-6492 envelope while the account isn't deployed
    pub async fn sign_message(&self, message: Bytes) -> Result<Bytes, ClientError> {
        let signature = self.account.sign_message(message).await?;
        self.wrap_if_undeployed(signature).await
    }

    /// ERC-1271 typed data signature, wrapped in an ERC-6492 envelope while the account isn't
    /// deployed
    pub async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Bytes, ClientError> {
        let signature = self.account.sign_typed_data(typed_data).await?;
        self.wrap_if_undeployed(signature).await
    }

    async fn wrap_if_undeployed(&self, signature: Bytes) -> Result<Bytes, ClientError> {
        if self.account.is_deployed().await? {
            Ok(signature)
        } else {
            Ok(self.account.wrap_signature_6492(&signature))
        }
    }

    pub async fn sign_message_with_6492(&self, message: Bytes) -> Result<Bytes, ClientError> {
        Ok(self.account.sign_message_with_6492(message).await?)
    }

    pub async fn sign_typed_data_with_6492(
        &self,
        typed_data: &TypedData,
    ) -> Result<Bytes, ClientError> {
        Ok(self.account.sign_typed_data_with_6492(typed_data).await?)
    }

    async fn send_self_call(
        &self,
        data: Bytes,
        overrides: &UserOperationOverrides,
        wait: bool,
    ) -> Result<UserOperationSubmission, ClientError> {
        let call = UserOperationCallData::Single(CallData::new(self.account.address(), data));
        let mut submission = self.send_user_operation(&call, overrides).await?;
        if wait {
            self.wait(&mut submission).await?;
        }
        Ok(submission)
    }

    /// Sends `transferOwnership(new_owner)` from the account to itself
    ///
    /// The client keeps signing with the previous owner, a new client is needed for `new_owner`.
    pub async fn transfer_ownership(
        &self,
        new_owner: Address,
        overrides: &UserOperationOverrides,
        wait: bool,
    ) -> Result<UserOperationSubmission, ClientError> {
        let data = self.account.encode_transfer_ownership(new_owner);
        self.send_self_call(data, overrides, wait).await
    }

    /// Sends `upgradeToAndCall(implementation, init_data)` from the account to itself
    pub async fn upgrade_account(
        &self,
        implementation: Address,
        init_data: Bytes,
        overrides: &UserOperationOverrides,
        wait: bool,
    ) -> Result<UserOperationSubmission, ClientError> {
        let data = self.account.encode_upgrade_to_and_call(implementation, &init_data);
        self.send_self_call(data, overrides, wait).await
    }

    pub async fn get_owner_address(&self) -> Result<Address, ClientError> {
        Ok(self.account.get_owner_address().await?)
    }
}
