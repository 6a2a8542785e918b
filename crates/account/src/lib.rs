//! LightAccount smart account: counterfactual address, call data encoding and owner signatures

mod account;
pub mod encoder;
mod error;
pub mod signature;

pub use account::{counterfactual_address, SmartAccount};
pub use error::AccountError;
pub use signature::{
    is_6492_signature, unwrap_6492, wrap_6492, SignablePayload, SignatureRequest,
};
