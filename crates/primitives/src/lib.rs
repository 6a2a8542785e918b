//! LightAccount (ERC-4337) primitive types
//!
//! This crate contains the version registry of LightAccount, the user operation types shared by
//! the account and client crates and packing/address helper functions.

pub mod call;
pub mod constants;
pub mod entry_point;
mod user_operation;
pub mod utils;
pub mod version;

pub use call::{CallData, UserOperationCallData};
pub use entry_point::EntryPointVersion;
pub use user_operation::{
    RpcUserOperation, TransactionSummary, UserOperationGasEstimation, UserOperationHash,
    UserOperationOverrides, UserOperationReceipt, UserOperationRequest, UserOperationV07,
};
pub use utils::get_address;
pub use version::{
    resolve, AccountVersion, AddressDerivation, MessageSigning, Selectors, VersionDescriptor,
    VersionError,
};
