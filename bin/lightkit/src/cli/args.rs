use crate::{
    utils::{parse_address, parse_duration, parse_u256, parse_version, validate_private_key},
    wallet,
};
use clap::{Parser, ValueEnum};
use ethers::{
    signers::LocalWallet,
    types::{Address, Bytes, U256},
};
use expanded_pathbuf::ExpandedPathBuf;
use lightkit_client::{ClientConfig, FeeOptions, PaymasterMode, PriorityFeeSource, WaitConfig};
use lightkit_primitives::{
    constants::{
        fees::BASE_FEE_BUFFER_PERC,
        rpc::HTTP_PORT,
        wait::{INTERVAL_MULTIPLIER_PERC, POLL_INTERVAL_MS, TIMEOUT_MS},
    },
    AccountVersion, UserOperationOverrides,
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

/// Node and bundler connection args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct EthClientArgs {
    /// Ethereum execution client RPC endpoint (`http(s)://` or `ws(s)://`).
    #[clap(long, default_value = "http://127.0.0.1:8545")]
    pub eth_client_address: String,

    /// Bundler RPC endpoint, also used for paymaster requests.
    ///
    /// By default, bundler methods are sent to the execution client endpoint.
    /// The endpoint must use the same transport as the execution client.
    #[clap(long)]
    pub bundler_address: Option<String>,

    /// Polling interval of the HTTP provider (in milliseconds).
    #[clap(long, default_value = "500", value_parser = parse_duration)]
    pub poll_interval: Duration,
}

impl EthClientArgs {
    pub fn is_http(&self) -> bool {
        self.eth_client_address.starts_with("http")
    }

    /// Bundler endpoint, checked against the transport of the execution client
    pub fn bundler_address(&self) -> eyre::Result<Option<&str>> {
        match self.bundler_address.as_deref() {
            Some(addr) if addr.starts_with("http") != self.is_http() => Err(eyre::eyre!(
                "Bundler {addr} must use the same transport as {}",
                self.eth_client_address
            )),
            addr => Ok(addr),
        }
    }
}

/// Owner of the smart account
#[derive(Debug, Clone, Parser)]
pub struct WalletArgs {
    /// Path to the file containing the mnemonic phrase of the owner.
    #[clap(long, conflicts_with = "private_key")]
    pub mnemonic_file: Option<ExpandedPathBuf>,

    /// Account index in the `m/44'/60'/0'/0` derivation path of the mnemonic.
    #[clap(long, default_value_t = 0)]
    pub mnemonic_index: u32,

    /// Hex encoded private key of the owner.
    #[clap(long, value_parser = validate_private_key)]
    pub private_key: Option<String>,
}

impl WalletArgs {
    pub fn wallet(&self, chain_id: u64) -> eyre::Result<LocalWallet> {
        match (&self.mnemonic_file, &self.private_key) {
            (Some(path), _) => wallet::from_mnemonic_file(path, self.mnemonic_index, chain_id),
            (None, Some(key)) => wallet::from_private_key(key, chain_id),
            (None, None) => Err(eyre::eyre!("Missing --mnemonic-file or --private-key")),
        }
    }
}

/// Smart account args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct AccountArgs {
    /// LightAccount version.
    #[clap(long = "account.version", default_value_t = AccountVersion::default(), value_parser = parse_version)]
    pub account_version: AccountVersion,

    /// Address of an existing account.
    ///
    /// By default, the counterfactual address of the owner and salt is used.
    #[clap(long = "account.address", value_parser = parse_address)]
    pub account_address: Option<Address>,

    /// Salt of the counterfactual address.
    #[clap(long = "account.salt", default_value = "0", value_parser = parse_u256)]
    pub salt: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaymasterKind {
    None,
    Erc7677,
    Vendor,
}

/// Sponsorship args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct PaymasterArgs {
    /// How user operations get sponsored.
    #[clap(long, value_enum, default_value_t = PaymasterKind::None)]
    pub paymaster: PaymasterKind,

    /// Gas policy of the vendor paymaster.
    #[clap(long = "paymaster.policy-id")]
    pub policy_id: Option<String>,

    /// JSON context passed to the ERC-7677 paymaster.
    #[clap(long = "paymaster.context", value_parser = parse_json)]
    pub context: Option<serde_json::Value>,
}

fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|err| format!("{s} is not valid JSON: {err}"))
}

impl PaymasterArgs {
    pub fn mode(&self) -> eyre::Result<PaymasterMode> {
        Ok(match self.paymaster {
            PaymasterKind::None => PaymasterMode::None,
            PaymasterKind::Erc7677 => PaymasterMode::Erc7677 { context: self.context.clone() },
            PaymasterKind::Vendor => PaymasterMode::Vendor {
                policy_id: self
                    .policy_id
                    .clone()
                    .ok_or_else(|| eyre::eyre!("Vendor paymaster requires --paymaster.policy-id"))?,
            },
        })
    }
}

/// Fee estimation args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct FeeArgs {
    /// Buffer added on top of the latest base fee (in percent).
    #[clap(long = "fees.base-fee-buffer", default_value_t = BASE_FEE_BUFFER_PERC)]
    pub base_fee_buffer: u64,

    /// Buffer added on top of the reported priority fee (in percent).
    #[clap(long = "fees.priority-fee-buffer", default_value_t = 0)]
    pub priority_fee_buffer: u64,

    /// Read the priority fee with `rundler_maxPriorityFeePerGas` instead of
    /// `eth_maxPriorityFeePerGas`.
    #[clap(long = "fees.rundler")]
    pub rundler: bool,
}

impl From<&FeeArgs> for FeeOptions {
    fn from(args: &FeeArgs) -> Self {
        Self {
            base_fee_buffer_percent: args.base_fee_buffer,
            priority_fee_buffer_percent: args.priority_fee_buffer,
            priority_fee_source: if args.rundler {
                PriorityFeeSource::Rundler
            } else {
                PriorityFeeSource::Node
            },
        }
    }
}

/// Receipt polling args (all in milliseconds)
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct WaitArgs {
    #[clap(long = "wait.timeout", default_value_t = TIMEOUT_MS)]
    pub wait_timeout: u64,

    #[clap(long = "wait.poll-interval", default_value_t = POLL_INTERVAL_MS)]
    pub wait_poll_interval: u64,

    /// Growth of the polling interval after each miss (in percent).
    #[clap(long = "wait.interval-multiplier", default_value_t = INTERVAL_MULTIPLIER_PERC)]
    pub wait_interval_multiplier: u64,
}

impl From<&WaitArgs> for WaitConfig {
    fn from(args: &WaitArgs) -> Self {
        Self {
            timeout: args.wait_timeout,
            poll_interval: args.wait_poll_interval,
            interval_multiplier: args.wait_interval_multiplier,
        }
    }
}

/// Everything needed to create a smart account client
#[derive(Debug, Clone, Parser)]
pub struct ClientArgs {
    #[clap(flatten)]
    pub eth_client: EthClientArgs,

    #[clap(flatten)]
    pub wallet: WalletArgs,

    #[clap(flatten)]
    pub account: AccountArgs,

    #[clap(flatten)]
    pub paymaster: PaymasterArgs,

    #[clap(flatten)]
    pub fees: FeeArgs,

    #[clap(flatten)]
    pub wait: WaitArgs,
}

impl ClientArgs {
    pub fn config(&self) -> eyre::Result<ClientConfig> {
        Ok(ClientConfig {
            version: self.account.account_version,
            account_address: self.account.account_address,
            salt: self.account.salt,
            paymaster: self.paymaster.mode()?,
            fee_options: FeeOptions::from(&self.fees),
            wait: WaitConfig::from(&self.wait),
        })
    }
}

/// Per user operation overrides
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct OverrideArgs {
    /// Key placed in the 192 high-order bits of the nonce.
    #[clap(long, value_parser = parse_u256)]
    pub nonce_key: Option<U256>,

    /// Full nonce, takes precedence over `--nonce-key`.
    #[clap(long, value_parser = parse_u256)]
    pub nonce: Option<U256>,

    /// Pay for the user operation from the account even if a paymaster is configured.
    #[clap(long)]
    pub bypass_paymaster: bool,

    #[clap(long, value_parser = parse_u256)]
    pub call_gas_limit: Option<U256>,

    #[clap(long, value_parser = parse_u256)]
    pub verification_gas_limit: Option<U256>,

    #[clap(long, value_parser = parse_u256)]
    pub pre_verification_gas: Option<U256>,

    #[clap(long, value_parser = parse_u256)]
    pub max_fee_per_gas: Option<U256>,

    #[clap(long, value_parser = parse_u256)]
    pub max_priority_fee_per_gas: Option<U256>,
}

impl OverrideArgs {
    pub fn overrides(&self) -> UserOperationOverrides {
        UserOperationOverrides {
            call_gas_limit: self.call_gas_limit,
            verification_gas_limit: self.verification_gas_limit,
            pre_verification_gas: self.pre_verification_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            paymaster_and_data: self.bypass_paymaster.then(Bytes::default),
            nonce_key: self.nonce_key,
            nonce: self.nonce,
        }
    }
}

/// Account RPC server args
#[derive(Debug, Clone, Parser, PartialEq)]
pub struct RpcArgs {
    /// Sets the RPC address to listen on.
    ///
    /// By default, this option is set to `127.0.0.1`
    #[clap(long = "rpc.addr", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub addr: IpAddr,

    /// Sets the RPC port to listen on.
    ///
    /// By default, this option is set to `3000`
    #[clap(long = "rpc.port", default_value_t = HTTP_PORT)]
    pub port: u16,
}

impl RpcArgs {
    pub fn listen_address(&self) -> String {
        SocketAddr::new(self.addr, self.port).to_string()
    }
}
