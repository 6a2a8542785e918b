use ethers::{
    providers::{ProviderError, RpcError},
    types::U256,
};
use lightkit_account::AccountError;
use lightkit_primitives::UserOperationHash;
use thiserror::Error;

/// Smart account client errors
#[derive(Debug, Error, Clone)]
pub enum ClientError {
    #[error(transparent)]
    Account(#[from] AccountError),

    /// A middleware stage failed and no override pins its fields
    #[error("{stage} stage failed for nonce 0x{nonce:x}: {message}")]
    MiddlewareStage {
        /// Name of the stage
        stage: String,
        /// Nonce of the user operation being built
        nonce: U256,
        /// The inner error message
        message: String,
    },

    /// The bundler refused the user operation
    #[error("user operation with nonce 0x{nonce:x} rejected ({code}): {message}")]
    SubmissionRejected {
        /// JSON-RPC error code returned by the bundler
        code: i64,
        message: String,
        nonce: U256,
    },

    /// The user operation wasn't mined in time or was evicted by the bundler
    #[error("user operation {hash} with nonce 0x{nonce:x} dropped: {reason}")]
    OperationDropped {
        hash: UserOperationHash,
        nonce: U256,
        reason: String,
    },

    /// Node or bundler call failed outside of the middleware stages
    #[error("provider error: {message}")]
    Provider {
        /// The inner error message
        message: String,
    },
}

impl ClientError {
    /// Whether the user operation can be superseded by drop-and-replace
    pub fn is_dropped(&self) -> bool {
        matches!(self, ClientError::OperationDropped { .. })
    }

    pub(crate) fn stage(stage: &str, nonce: U256, message: impl Into<String>) -> Self {
        Self::MiddlewareStage { stage: stage.into(), nonce, message: message.into() }
    }

    pub(crate) fn provider(err: &ProviderError) -> Self {
        Self::Provider { message: rpc_error_message(err) }
    }

    pub(crate) fn rejected(err: &ProviderError, nonce: U256) -> Self {
        match err.as_error_response() {
            Some(err) => Self::SubmissionRejected {
                code: err.code,
                message: err.message.clone(),
                nonce,
            },
            None => Self::provider(err),
        }
    }
}

/// Message of the JSON-RPC error object if there is one
pub(crate) fn rpc_error_message(err: &ProviderError) -> String {
    match err.as_error_response() {
        Some(err) => format!("{} ({})", err.message, err.code),
        None => err.to_string(),
    }
}
