use ethers::{
    providers::{MockProvider, Provider},
    signers::LocalWallet,
    types::{transaction::eip712::TypedData, U256},
};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use lightkit_account::SmartAccount;
use lightkit_client::{ClientConfig, SmartAccountClient};
use lightkit_primitives::AccountVersion;
use std::{
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    sync::{
        atomic::{AtomicU16, Ordering},
        Arc,
    },
};

// anvil's first account
pub const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ACCOUNT: &str = "0x9EfDfCB56390eDd8b2eAE6daBC148CED3491AAf6";

static PORT: AtomicU16 = AtomicU16::new(8000);

/// A localhost address with an increasing port number so that tests don't share ports
pub fn test_address() -> String {
    let port = PORT.fetch_add(1, Ordering::SeqCst);
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).to_string()
}

pub fn build_http_client(address: SocketAddr) -> eyre::Result<HttpClient> {
    Ok(HttpClientBuilder::default().build(format!("http://{address}"))?)
}

pub fn account_client(
    version: AccountVersion,
) -> eyre::Result<(Arc<SmartAccountClient<Provider<MockProvider>, LocalWallet>>, MockProvider)> {
    let (provider, mock) = Provider::mocked();
    let account = SmartAccount::new(
        Arc::new(provider),
        OWNER_KEY.parse::<LocalWallet>()?,
        version,
        ACCOUNT.parse()?,
        U256::zero(),
        1,
    );
    let config = ClientConfig { version, ..Default::default() };
    Ok((Arc::new(SmartAccountClient::from_account(account, config)), mock))
}

pub fn typed_mail() -> eyre::Result<TypedData> {
    Ok(serde_json::from_value(serde_json::json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "chainId", "type": "uint256" },
            ],
            "Mail": [{ "name": "contents", "type": "string" }],
        },
        "primaryType": "Mail",
        "domain": { "name": "Mailbox", "chainId": 1 },
        "message": { "contents": "Hello, Bob!" },
    }))?)
}
