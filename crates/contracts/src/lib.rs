//! Contract interfaces of the ERC-4337 entry point and LightAccount

pub mod entry_point;
mod error;
mod gen;

use ethers::{
    abi::AbiEncode,
    types::{Address, Bytes, U256},
};

pub use entry_point::EntryPoint;
pub use error::{decode_revert, revert_data, revert_reason, EntryPointError};
pub use gen::{
    EntryPointAPIErrors, ExecuteBatchCall, ExecuteCall, FailedOp, LightAccountAPI,
    LightAccountFactoryAPI, SenderAddressResult, TransferOwnershipCall, UpgradeToAndCallCall,
    SELECTORS_NAMES,
};

/// `createAccount(owner, salt)` call data of the LightAccount factory
pub fn create_account_call_data(owner: Address, salt: U256) -> Bytes {
    gen::CreateAccountCall { owner, salt }.encode().into()
}
