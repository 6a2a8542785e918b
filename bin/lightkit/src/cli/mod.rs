use crate::utils::run_until_ctrl_c;
use clap::{value_parser, Parser, Subcommand};
use commands::ClientCommand;

pub mod args;
pub mod commands;

/// The main LightKit CLI interface
#[derive(Debug, Parser)]
#[command(author, version, about = "LightKit", long_about = None)]
pub struct Cli {
    /// The command to execute
    #[clap(subcommand)]
    command: Commands,

    /// The verbosity level
    #[clap(long, short, global = true, default_value_t = 2, value_parser = value_parser!(u8).range(..=4))]
    verbosity: u8,
}

impl Cli {
    /// Get the log level based on the verbosity level
    pub fn get_log_level(&self) -> String {
        match self.verbosity {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
        .into()
    }
}

/// Commands to be executed
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the address of the smart account
    #[command(name = "address")]
    Address(commands::AddressCommand),

    /// Send a user operation
    #[command(name = "send")]
    Send(Box<commands::SendCommand>),

    /// Sign a message with the smart account
    #[command(name = "sign-message")]
    SignMessage(Box<commands::SignMessageCommand>),

    /// Sign EIP-712 typed data with the smart account
    #[command(name = "sign-typed-data")]
    SignTypedData(Box<commands::SignTypedDataCommand>),

    /// Transfer the ownership of the smart account
    #[command(name = "transfer-ownership")]
    TransferOwnership(Box<commands::TransferOwnershipCommand>),

    /// Upgrade the smart account implementation
    #[command(name = "upgrade")]
    Upgrade(Box<commands::UpgradeCommand>),

    /// Start the account JSON-RPC server
    #[command(name = "rpc")]
    Rpc(Box<commands::RpcCommand>),

    /// Create a wallet for the owner of the smart account
    #[command(name = "create-wallet")]
    CreateWallet(commands::CreateWalletCommand),
}

pub fn run() -> eyre::Result<()> {
    let cli = Cli::parse();

    let rust_log = match std::env::var("RUST_LOG") {
        Ok(val) => format!("{val},lightkit={}", cli.get_log_level()),
        Err(_) => format!("lightkit={}", cli.get_log_level()),
    };
    std::env::set_var("RUST_LOG", rust_log);
    tracing_subscriber::fmt::init();

    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    let task = async move {
        match cli.command {
            Commands::Address(command) => command.execute().await,
            Commands::Send(command) => command.execute().await,
            Commands::SignMessage(command) => command.execute().await,
            Commands::SignTypedData(command) => command.execute().await,
            Commands::TransferOwnership(command) => command.execute().await,
            Commands::Upgrade(command) => command.execute().await,
            Commands::Rpc(command) => command.execute().await,
            Commands::CreateWallet(command) => command.execute(),
        }
    };

    rt.block_on(run_until_ctrl_c(task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level() {
        let create_wallet = ["create-wallet", "--output-path", "/tmp/owner"];

        let cli =
            Cli::try_parse_from(["lightkit", "-v", "4"].iter().chain(&create_wallet)).unwrap();
        assert_eq!(cli.get_log_level(), "trace");

        let cli = Cli::try_parse_from(["lightkit"].iter().chain(&create_wallet)).unwrap();
        assert_eq!(cli.get_log_level(), "info");

        assert!(Cli::try_parse_from(vec!["lightkit", "-v", "5", "address"]).is_err());
    }

    #[test]
    fn subcommands() {
        let cli = Cli::try_parse_from(vec![
            "lightkit",
            "send",
            "--private-key",
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "--call",
            "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "--nonce-key",
            "1",
            "--bypass-paymaster",
            "--replace-on-timeout",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Send(_)));

        let cli = Cli::try_parse_from(vec!["lightkit", "rpc", "--rpc.port", "3001"]).unwrap();
        assert!(matches!(cli.command, Commands::Rpc(_)));

        assert!(Cli::try_parse_from(vec!["lightkit", "bundle"]).is_err());
    }
}
