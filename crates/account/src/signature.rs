//! Owner signatures
//!
//! Signing is split into [SmartAccount::prepare_sign] (what the owner has to sign) and
//! [SmartAccount::format_sign] (what the account expects), so the cryptographic step can run
//! outside of the process. ERC-6492 envelopes let verifiers check signatures of accounts that
//! aren't deployed yet.

use crate::{account::SmartAccount, error::AccountError};
use ethers::{
    abi::{decode, encode, ParamType, Token},
    providers::Middleware,
    signers::Signer,
    types::{
        transaction::eip712::{Eip712, TypedData},
        Address, Bytes,
    },
    utils::hash_message,
};
use lightkit_primitives::{
    constants::{erc6492::MAGIC_BYTES, light_account::DOMAIN_NAME},
    MessageSigning, UserOperationHash,
};
use tracing::trace;

const ERC1271: &str = "1271";

/// Payload signed on behalf of the account
#[derive(Clone, Debug)]
pub enum SignablePayload {
    /// EIP-191 personal message
    Message(Bytes),
    /// EIP-712 typed data
    TypedData(Box<TypedData>),
}

/// What the owner signer has to sign
#[derive(Clone, Debug)]
pub enum SignatureRequest {
    /// `personal_sign` of the bytes
    PersonalSign(Bytes),
    /// `eth_signTypedData_v4` of the payload
    TypedData(Box<TypedData>),
}

/// Typed data `LightAccountMessage(bytes message)` validated by the account's `isValidSignature`
pub fn light_account_message(
    domain_version: &str,
    chain_id: u64,
    account: Address,
    message_hash: [u8; 32],
) -> Result<TypedData, AccountError> {
    let typed_data = serde_json::json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "version", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" },
            ],
            "LightAccountMessage": [{ "name": "message", "type": "bytes" }],
        },
        "primaryType": "LightAccountMessage",
        "domain": {
            "name": DOMAIN_NAME,
            "version": domain_version,
            "chainId": chain_id,
            "verifyingContract": account,
        },
        "message": { "message": Bytes::from(message_hash.to_vec()) },
    });

    serde_json::from_value(typed_data)
        .map_err(|err| AccountError::Signer { message: format!("invalid typed data: {err}") })
}

/// Wraps `signature` in an ERC-6492 envelope
pub fn wrap_6492(factory: Address, factory_call_data: &Bytes, signature: &Bytes) -> Bytes {
    let encoded = encode(&[
        Token::Address(factory),
        Token::Bytes(factory_call_data.to_vec()),
        Token::Bytes(signature.to_vec()),
    ]);
    [&encoded[..], &MAGIC_BYTES[..]].concat().into()
}

pub fn is_6492_signature(signature: &[u8]) -> bool {
    signature.len() > MAGIC_BYTES.len() && signature.ends_with(&MAGIC_BYTES)
}

/// Splits an ERC-6492 envelope into factory, factory call data and inner signature
pub fn unwrap_6492(signature: &[u8]) -> Option<(Address, Bytes, Bytes)> {
    if !is_6492_signature(signature) {
        return None;
    }

    let body = &signature[..signature.len() - MAGIC_BYTES.len()];
    let mut tokens =
        decode(&[ParamType::Address, ParamType::Bytes, ParamType::Bytes], body).ok()?.into_iter();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(Token::Address(factory)), Some(Token::Bytes(data)), Some(Token::Bytes(sig))) => {
            Some((factory, data.into(), sig.into()))
        }
        _ => None,
    }
}

impl<M: Middleware + 'static, S: Signer> SmartAccount<M, S> {
    fn unsupported(&self, capability: &str) -> AccountError {
        AccountError::UnsupportedOperation {
            version: self.version(),
            capability: capability.into(),
        }
    }

    /// Normalizes `payload` into what the owner has to sign for this account version
    pub fn prepare_sign(&self, payload: SignablePayload) -> Result<SignatureRequest, AccountError> {
        match self.descriptor().message_signing {
            MessageSigning::Unsupported => Err(self.unsupported(ERC1271)),
            MessageSigning::Raw => Ok(match payload {
                SignablePayload::Message(message) => SignatureRequest::PersonalSign(message),
                SignablePayload::TypedData(typed_data) => SignatureRequest::TypedData(typed_data),
            }),
            MessageSigning::TypedWrapper { domain_version } => {
                let message_hash = match payload {
                    SignablePayload::Message(message) => hash_message(message).to_fixed_bytes(),
                    SignablePayload::TypedData(typed_data) => typed_data
                        .encode_eip712()
                        .map_err(|err| AccountError::Signer { message: err.to_string() })?,
                };
                let typed_data = light_account_message(
                    domain_version,
                    self.chain_id(),
                    self.address(),
                    message_hash,
                )?;
                Ok(SignatureRequest::TypedData(Box::new(typed_data)))
            }
        }
    }

    /// Turns the owner's raw signature into the signature the account validates
    pub fn format_sign(&self, signature: Bytes) -> Bytes {
        match self.descriptor().signature_prefix {
            Some(prefix) => [&[prefix][..], signature.as_ref()].concat().into(),
            None => signature,
        }
    }

    /// Signs the prepared request with the owner signer
    pub async fn sign_request(&self, request: &SignatureRequest) -> Result<Bytes, AccountError> {
        let signature = match request {
            SignatureRequest::PersonalSign(message) => {
                self.signer().sign_message(message).await.map_err(AccountError::signer)?
            }
            SignatureRequest::TypedData(typed_data) => self
                .signer()
                .sign_typed_data(typed_data.as_ref())
                .await
                .map_err(AccountError::signer)?,
        };
        Ok(signature.to_vec().into())
    }

    /// ERC-1271 signature of a personal message
    pub async fn sign_message(&self, message: Bytes) -> Result<Bytes, AccountError> {
        let request = self.prepare_sign(SignablePayload::Message(message))?;
        trace!("Signing message for {:?} with {request:?}", self.address());
        Ok(self.format_sign(self.sign_request(&request).await?))
    }

    /// ERC-1271 signature of typed data
    pub async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Bytes, AccountError> {
        let payload = SignablePayload::TypedData(Box::new(typed_data.clone()));
        let request = self.prepare_sign(payload)?;
        trace!("Signing typed data for {:?} with {request:?}", self.address());
        Ok(self.format_sign(self.sign_request(&request).await?))
    }

    /// Signature of a user operation (personal sign of its hash)
    pub async fn sign_user_operation_hash(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Bytes, AccountError> {
        let signature =
            self.signer().sign_message(hash.0.as_bytes()).await.map_err(AccountError::signer)?;
        Ok(self.format_sign(signature.to_vec().into()))
    }

    /// ERC-6492 envelope deploying this account
    pub fn wrap_signature_6492(&self, signature: &Bytes) -> Bytes {
        wrap_6492(self.descriptor().factory, &self.factory_call_data(), signature)
    }

    pub async fn sign_message_with_6492(&self, message: Bytes) -> Result<Bytes, AccountError> {
        let signature = self.sign_message(message).await?;
        Ok(self.wrap_signature_6492(&signature))
    }

    pub async fn sign_typed_data_with_6492(
        &self,
        typed_data: &TypedData,
    ) -> Result<Bytes, AccountError> {
        let signature = self.sign_typed_data(typed_data).await?;
        Ok(self.wrap_signature_6492(&signature))
    }
}
