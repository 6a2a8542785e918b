use ethers::{
    contract::{abigen, EthCall},
    types::Selector,
};
use lazy_static::lazy_static;
use std::collections::HashMap;

abigen!(
    EntryPointAPI,
    r#"[
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce)
        function getSenderAddress(bytes memory initCode) external
        error FailedOp(uint256 opIndex, string reason)
        error SenderAddressResult(address sender)
    ]"#
);

abigen!(
    LightAccountAPI,
    r#"[
        function owner() external view returns (address)
        function execute(address dest, uint256 value, bytes calldata func) external
        function executeBatch(address[] calldata dest, uint256[] calldata value, bytes[] calldata func) external
        function transferOwnership(address newOwner) external
        function upgradeToAndCall(address newImplementation, bytes memory data) external payable
    ]"#
);

abigen!(
    LightAccountFactoryAPI,
    r#"[
        function createAccount(address owner, uint256 salt) external returns (address)
        function getAddress(address owner, uint256 salt) external view returns (address)
    ]"#
);

lazy_static! {
    pub static ref SELECTORS_NAMES: HashMap<Selector, String> = {
        let mut map = HashMap::new();
        // account
        map.insert(light_account_api::ExecuteCall::selector(), light_account_api::ExecuteCall::function_name().into());
        map.insert(light_account_api::ExecuteBatchCall::selector(), light_account_api::ExecuteBatchCall::function_name().into());
        map.insert(light_account_api::TransferOwnershipCall::selector(), light_account_api::TransferOwnershipCall::function_name().into());
        map.insert(light_account_api::UpgradeToAndCallCall::selector(), light_account_api::UpgradeToAndCallCall::function_name().into());
        // factory
        map.insert(light_account_factory_api::CreateAccountCall::selector(), light_account_factory_api::CreateAccountCall::function_name().into());
        map
    };
}
