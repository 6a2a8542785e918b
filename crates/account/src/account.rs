use crate::{encoder, error::AccountError};
use ethers::{
    providers::Middleware,
    signers::Signer,
    types::{Address, Bytes, U256},
};
use lightkit_contracts::{create_account_call_data, EntryPoint, LightAccountAPI};
use lightkit_primitives::{
    utils::{erc1967_proxy_address, pack_factory_data},
    AccountVersion, AddressDerivation, CallData, UserOperationCallData, VersionDescriptor,
};
use std::{fmt, sync::Arc};
use tracing::debug;

/// One LightAccount (deployed or counterfactual) bound to its version, owner signer and entry
/// point
#[derive(Clone)]
pub struct SmartAccount<M: Middleware + 'static, S: Signer> {
    eth_client: Arc<M>,
    signer: S,
    descriptor: &'static VersionDescriptor,
    address: Address,
    salt: U256,
    chain_id: u64,
    entry_point: EntryPoint<M>,
}

impl<M: Middleware + 'static, S: Signer> fmt::Debug for SmartAccount<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmartAccount")
            .field("version", &self.descriptor.version)
            .field("address", &self.address)
            .field("owner", &self.signer.address())
            .field("salt", &self.salt)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl<M: Middleware + 'static, S: Signer> SmartAccount<M, S> {
    /// Binds an account to its address without any node call
    pub fn new(
        eth_client: Arc<M>,
        signer: S,
        version: AccountVersion,
        address: Address,
        salt: U256,
        chain_id: u64,
    ) -> Self {
        let descriptor = version.descriptor();
        let entry_point = EntryPoint::new(eth_client.clone(), descriptor.entry_point_address());
        Self { eth_client, signer, descriptor, address, salt, chain_id, entry_point }
    }

    /// Creates the account of `signer`
    ///
    /// Without an explicit `address`, the counterfactual address is derived from the owner, the
    /// factory of the version and `salt`.
    pub async fn create(
        eth_client: Arc<M>,
        signer: S,
        version: AccountVersion,
        address: Option<Address>,
        salt: U256,
    ) -> Result<Self, AccountError> {
        let chain_id = eth_client.get_chainid().await.map_err(AccountError::provider)?;
        let chain_id = u64::try_from(chain_id).map_err(|_| {
            AccountError::provider(format!("chain id {chain_id} does not fit in 64 bits"))
        })?;

        let address = match address {
            Some(address) => address,
            None => {
                let entry_point =
                    EntryPoint::new(eth_client.clone(), version.descriptor().entry_point_address());
                counterfactual_address(&entry_point, version, signer.address(), salt).await?
            }
        };

        debug!("LightAccount {version} at {address:?} (chain {chain_id})");
        Ok(Self::new(eth_client, signer, version, address, salt, chain_id))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address of the owner signer
    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn version(&self) -> AccountVersion {
        self.descriptor.version
    }

    pub fn descriptor(&self) -> &'static VersionDescriptor {
        self.descriptor
    }

    pub fn salt(&self) -> U256 {
        self.salt
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn entry_point(&self) -> &EntryPoint<M> {
        &self.entry_point
    }

    pub fn eth_client(&self) -> Arc<M> {
        self.eth_client.clone()
    }

    /// Placeholder signature of the version, only valid for gas estimation
    pub fn dummy_signature(&self) -> Bytes {
        self.descriptor.dummy_signature.clone()
    }

    /// `createAccount(owner, salt)` call of the factory
    pub fn factory_call_data(&self) -> Bytes {
        create_account_call_data(self.owner(), self.salt)
    }

    /// `factory ++ createAccount(owner, salt)`, regardless of the deployment state
    pub fn factory_init_code(&self) -> Bytes {
        pack_factory_data(self.descriptor.factory, &self.factory_call_data())
    }

    pub async fn is_deployed(&self) -> Result<bool, AccountError> {
        let code = self
            .eth_client
            .get_code(self.address, None)
            .await
            .map_err(AccountError::provider)?;
        Ok(!code.is_empty())
    }

    /// Init code of the next user operation (empty once the account is deployed)
    pub async fn init_code(&self) -> Result<Bytes, AccountError> {
        if self.is_deployed().await? {
            Ok(Bytes::default())
        } else {
            Ok(self.factory_init_code())
        }
    }

    /// Current nonce of the account in the namespace of `key`
    pub async fn get_nonce(&self, key: U256) -> Result<U256, AccountError> {
        Ok(self.entry_point.get_nonce(&self.address, key).await?)
    }

    /// Owner stored on-chain
    pub async fn get_owner_address(&self) -> Result<Address, AccountError> {
        LightAccountAPI::new(self.address, self.eth_client.clone())
            .owner()
            .call()
            .await
            .map_err(AccountError::provider)
    }

    pub fn encode_execute(&self, call: &CallData) -> Bytes {
        encoder::encode_execute(&self.descriptor.selectors, call)
    }

    pub fn encode_batch_execute(&self, calls: &[CallData]) -> Result<Bytes, AccountError> {
        encoder::encode_batch_execute(&self.descriptor.selectors, calls)
    }

    pub fn encode_transfer_ownership(&self, new_owner: Address) -> Bytes {
        encoder::encode_transfer_ownership(&self.descriptor.selectors, new_owner)
    }

    pub fn encode_upgrade_to_and_call(&self, implementation: Address, init_data: &Bytes) -> Bytes {
        encoder::encode_upgrade_to_and_call(&self.descriptor.selectors, implementation, init_data)
    }

    pub fn encode_call_data(
        &self,
        call_data: &UserOperationCallData,
    ) -> Result<Bytes, AccountError> {
        encoder::encode_call_data(&self.descriptor.selectors, call_data)
    }
}

/// Counterfactual address of the account owned by `owner`, it matches the factory's CREATE2
pub async fn counterfactual_address<M: Middleware + 'static>(
    entry_point: &EntryPoint<M>,
    version: AccountVersion,
    owner: Address,
    salt: U256,
) -> Result<Address, AccountError> {
    let descriptor = version.descriptor();
    match descriptor.address_derivation {
        AddressDerivation::Erc1967Proxy => {
            Ok(erc1967_proxy_address(descriptor.factory, descriptor.implementation, owner, salt))
        }
        AddressDerivation::EntryPointQuery => {
            let init_code =
                pack_factory_data(descriptor.factory, &create_account_call_data(owner, salt));
            Ok(entry_point.get_sender_address(init_code).await?.sender)
        }
    }
}
