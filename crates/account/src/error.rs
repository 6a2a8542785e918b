use ethers::types::Selector;
use lightkit_contracts::EntryPointError;
use lightkit_primitives::{AccountVersion, VersionError};
use thiserror::Error;

/// Smart account errors
#[derive(Debug, Error, Clone)]
pub enum AccountError {
    /// Unrecognized version tag
    #[error(transparent)]
    UnknownVersion(#[from] VersionError),

    /// The version lacks the capability needed by the operation
    #[error("Version {version} of LightAccount doesn't support {capability}")]
    UnsupportedOperation {
        /// Version of the account
        version: AccountVersion,
        /// Missing capability
        capability: String,
    },

    /// Malformed call data
    #[error("encoding error for {selector}: {message}")]
    Encoding {
        /// Function being encoded
        selector: String,
        /// What's wrong with the input
        message: String,
    },

    /// The owner signer failed
    #[error("signer error: {message}")]
    Signer {
        /// The inner error message
        message: String,
    },

    /// Node call failed
    #[error("provider error: {message}")]
    Provider {
        /// The inner error message
        message: String,
    },

    /// Entry point call failed
    #[error(transparent)]
    EntryPoint(#[from] EntryPointError),
}

impl AccountError {
    pub(crate) fn encoding(selector: Selector, message: impl Into<String>) -> Self {
        let selector = lightkit_contracts::SELECTORS_NAMES
            .get(&selector)
            .cloned()
            .unwrap_or_else(|| format!("0x{}", ethers::utils::hex::encode(selector)));
        Self::Encoding { selector, message: message.into() }
    }

    pub(crate) fn signer<E: std::fmt::Display>(err: E) -> Self {
        Self::Signer { message: err.to_string() }
    }

    pub(crate) fn provider<E: std::fmt::Display>(err: E) -> Self {
        Self::Provider { message: err.to_string() }
    }
}
