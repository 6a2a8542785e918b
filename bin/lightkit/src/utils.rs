use ethers::{
    providers::{Http, Middleware, Provider, Ws},
    types::{Address, Bytes, U256},
};
use lightkit_primitives::{resolve, AccountVersion, CallData};
use pin_utils::pin_mut;
use std::{future::Future, str::FromStr, time::Duration};
use tracing::info;

/// Parses address from string
pub fn parse_address(s: &str) -> Result<Address, String> {
    Address::from_str(s).map_err(|_| format!("String {s} is not a valid address"))
}

/// Parses U256 from a decimal or `0x`-prefixed hexadecimal string
pub fn parse_u256(s: &str) -> Result<U256, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).ok(),
        None => U256::from_dec_str(s).ok(),
    };
    parsed.ok_or_else(|| format!("String {s} is not a valid U256"))
}

/// Chain id as reported by the node, rejecting ids wider than 64 bits
pub fn chain_id_u64(chain_id: U256) -> eyre::Result<u64> {
    u64::try_from(chain_id)
        .map_err(|_| eyre::eyre!("Chain id {chain_id} does not fit in 64 bits"))
}

/// Parses hex encoded bytes from string
pub fn parse_bytes(s: &str) -> Result<Bytes, String> {
    Bytes::from_str(s).map_err(|_| format!("String {s} is not valid hex data"))
}

/// Parses LightAccount version tag
pub fn parse_version(s: &str) -> Result<AccountVersion, String> {
    resolve(s).map(|descriptor| descriptor.version).map_err(|err| err.to_string())
}

/// Parses a call in the form `target[:data[:value]]`
pub fn parse_call(s: &str) -> Result<CallData, String> {
    let mut split = s.split(':');
    let target = parse_address(split.next().unwrap_or_default())?;
    let data = split.next().map(parse_bytes).transpose()?.unwrap_or_default();
    let call = CallData::new(target, data);

    let call = match split.next() {
        Some(value) => call.with_value(parse_u256(value)?),
        None => call,
    };

    if split.next().is_some() {
        return Err(format!("Call {s} is not a valid target:data:value"));
    }
    Ok(call)
}

pub fn validate_private_key(hex_string: &str) -> Result<String, String> {
    let hex_string = hex_string.strip_prefix("0x").unwrap_or(hex_string);
    let chars = hex_string.chars();

    if chars.clone().count() != 64 {
        return Err(format!("{hex_string} is not a valid private key"));
    }

    for c in chars {
        if !c.is_ascii_hexdigit() {
            return Err(format!("{hex_string} is not a valid hexadecimal string"));
        }
    }

    Ok(String::from(hex_string))
}

/// Parses duration in milliseconds
pub fn parse_duration(duration: &str) -> Result<Duration, String> {
    let millis: u64 = duration.parse().map_err(|_| format!("{duration} must be unsigned int"))?;
    Ok(Duration::from_millis(millis))
}

/// Creates ethers provider with HTTP connection
pub async fn create_http_provider(
    addr: &str,
    poll_interval: Duration,
) -> eyre::Result<Provider<Http>> {
    let provider = Provider::<Http>::try_from(addr)?;
    let chain_id = provider.get_chainid().await?;
    info!("Connected to {addr} (chain {chain_id})");

    Ok(provider.interval(poll_interval))
}

/// Creates ethers provider with WebSockets connection
pub async fn create_ws_provider(addr: &str) -> eyre::Result<Provider<Ws>> {
    let provider = Provider::<Ws>::connect_with_reconnects(addr, usize::MAX).await?;
    let chain_id = provider.get_chainid().await?;
    info!("Connected to {addr} (chain {chain_id})");

    Ok(provider)
}

/// Runs the future to completion or until:
/// - `ctrl-c` is received.
/// - `SIGTERM` is received (unix only).
pub async fn run_until_ctrl_c<F, E>(fut: F) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    E: Send + Sync + 'static + From<std::io::Error>,
{
    let ctrl_c = tokio::signal::ctrl_c();

    let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let sigterm = stream.recv();
    pin_mut!(sigterm, ctrl_c, fut);

    tokio::select! {
        _ = ctrl_c => {
            info!("Received ctrl-c signal.");
        },
        _ = sigterm => {
            info!("Received SIGTERM signal.");
        },
        res = fut => res?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_radix() {
        assert_eq!(parse_u256("18"), Ok(U256::from(18)));
        assert_eq!(parse_u256("0x12"), Ok(U256::from(18)));
        assert_eq!(parse_u256("0xzz"), Err("String 0xzz is not a valid U256".into()));
        assert_eq!(parse_u256("1e3"), Err("String 1e3 is not a valid U256".into()));
    }

    #[test]
    fn chain_ids() {
        assert_eq!(chain_id_u64(U256::from(137)).unwrap(), 137);
        assert!(chain_id_u64(U256::from(u64::MAX) + 1).is_err());
    }

    #[test]
    fn version_tags() {
        assert_eq!(parse_version("v2.0.0"), Ok(AccountVersion::V2_0_0));
        assert_eq!(parse_version("v3.0.0"), Err("Unknown LightAccount version v3.0.0".into()));
    }

    #[test]
    fn calls() -> eyre::Result<()> {
        let target: Address = "0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef".parse()?;

        let call =
            parse_call("0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef").map_err(eyre::Report::msg)?;
        assert_eq!(call, CallData::new(target, Bytes::default()));

        let call = parse_call("0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef:0xcafe:0x10")
            .map_err(eyre::Report::msg)?;
        assert_eq!(call, CallData::new(target, "0xcafe".parse()?).with_value(16.into()));

        assert!(parse_call("0xdeadbeef").is_err());
        assert!(parse_call("0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef:0x:1:2").is_err());
        Ok(())
    }

    #[test]
    fn private_keys() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        assert_eq!(validate_private_key(&format!("0x{key}")), Ok(key.to_string()));
        assert!(validate_private_key("0x1234").is_err());
    }
}
