use super::args::{ClientArgs, OverrideArgs, RpcArgs};
use crate::utils::{
    chain_id_u64, create_http_provider, create_ws_provider, parse_address, parse_bytes,
    parse_call,
};
use async_trait::async_trait;
use clap::Parser;
use ethers::{
    providers::Middleware,
    signers::{LocalWallet, Signer},
    types::{transaction::eip712::TypedData, Address, Bytes},
};
use expanded_pathbuf::ExpandedPathBuf;
use lightkit_client::{SmartAccountClient, UserOperationSubmission};
use lightkit_primitives::{CallData, UserOperationCallData};
use lightkit_rpc::{AccountApiServer, AccountApiServerImpl, JsonRpcServer};
use std::{fs, sync::Arc};
use tracing::info;

/// Command operating a smart account through a [SmartAccountClient]
#[async_trait]
pub trait ClientCommand: Send + Sync {
    fn client_args(&self) -> &ClientArgs;

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()>;

    /// Connects to the node (and bundler) and runs the command
    async fn execute(&self) -> eyre::Result<()> {
        let args = self.client_args();
        let config = args.config()?;
        let bundler_address = args.eth_client.bundler_address()?;
        let eth_client_address = args.eth_client.eth_client_address.as_str();

        if args.eth_client.is_http() {
            let poll_interval = args.eth_client.poll_interval;
            let eth_client =
                Arc::new(create_http_provider(eth_client_address, poll_interval).await?);
            let chain_id = chain_id_u64(eth_client.get_chainid().await?)?;

            let mut client =
                SmartAccountClient::new(eth_client, args.wallet.wallet(chain_id)?, config).await?;
            if let Some(addr) = bundler_address {
                let bundler = create_http_provider(addr, poll_interval).await?;
                client = client.with_bundler(Arc::new(bundler));
            }
            self.run(client).await
        } else {
            let eth_client = Arc::new(create_ws_provider(eth_client_address).await?);
            let chain_id = chain_id_u64(eth_client.get_chainid().await?)?;

            let mut client =
                SmartAccountClient::new(eth_client, args.wallet.wallet(chain_id)?, config).await?;
            if let Some(addr) = bundler_address {
                client = client.with_bundler(Arc::new(create_ws_provider(addr).await?));
            }
            self.run(client).await
        }
    }
}

fn print_submission(submission: &UserOperationSubmission) -> eyre::Result<()> {
    info!("User operation {} {}", submission.hash, submission.state);
    println!("{}", serde_json::to_string_pretty(submission)?);
    Ok(())
}

/// Print the address, deployment state and owner of the account
#[derive(Debug, Parser)]
pub struct AddressCommand {
    #[clap(flatten)]
    client: ClientArgs,
}

#[async_trait]
impl ClientCommand for AddressCommand {
    fn client_args(&self) -> &ClientArgs {
        &self.client
    }

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()> {
        let account = client.account();
        println!("address: {:?}", account.address());
        println!("version: {}", account.version());

        if account.is_deployed().await? {
            println!("owner: {:?}", client.get_owner_address().await?);
        } else {
            println!("owner: {:?} (not deployed)", account.owner());
        }
        Ok(())
    }
}

/// Send a user operation executing one or more calls
#[derive(Debug, Parser)]
pub struct SendCommand {
    #[clap(flatten)]
    client: ClientArgs,

    #[clap(flatten)]
    overrides: OverrideArgs,

    /// Call executed by the account as `target[:data[:value]]`, repeat for a batch.
    #[clap(long = "call", required = true, value_parser = parse_call)]
    calls: Vec<CallData>,

    /// Wait for the user operation to be mined.
    #[clap(long)]
    wait: bool,

    /// Replace the user operation once if it isn't mined in time (implies `--wait`).
    #[clap(long)]
    replace_on_timeout: bool,
}

impl SendCommand {
    fn call_data(&self) -> UserOperationCallData {
        match self.calls.as_slice() {
            [call] => UserOperationCallData::Single(call.clone()),
            calls => UserOperationCallData::Batch(calls.to_vec()),
        }
    }
}

#[async_trait]
impl ClientCommand for SendCommand {
    fn client_args(&self) -> &ClientArgs {
        &self.client
    }

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()> {
        let call_data = self.call_data();
        let overrides = self.overrides.overrides();

        let submission = if self.wait || self.replace_on_timeout {
            client.send_and_wait(&call_data, &overrides, self.replace_on_timeout).await?
        } else {
            client.send_user_operation(&call_data, &overrides).await?
        };
        print_submission(&submission)
    }
}

/// Sign a message with the account (ERC-1271)
#[derive(Debug, Parser)]
pub struct SignMessageCommand {
    #[clap(flatten)]
    client: ClientArgs,

    /// The message, hex encoded if `--hex` is set.
    message: String,

    #[clap(long)]
    hex: bool,

    /// Always wrap the signature in an ERC-6492 envelope.
    ///
    /// By default, only signatures of undeployed accounts are wrapped.
    #[clap(long)]
    erc6492: bool,
}

impl SignMessageCommand {
    fn message(&self) -> eyre::Result<Bytes> {
        if self.hex {
            parse_bytes(&self.message).map_err(eyre::Report::msg)
        } else {
            Ok(Bytes::from(self.message.as_bytes().to_vec()))
        }
    }
}

#[async_trait]
impl ClientCommand for SignMessageCommand {
    fn client_args(&self) -> &ClientArgs {
        &self.client
    }

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()> {
        let message = self.message()?;
        let signature = if self.erc6492 {
            client.sign_message_with_6492(message).await?
        } else {
            client.sign_message(message).await?
        };
        println!("{signature}");
        Ok(())
    }
}

/// Sign EIP-712 typed data read from a JSON file with the account (ERC-1271)
#[derive(Debug, Parser)]
pub struct SignTypedDataCommand {
    #[clap(flatten)]
    client: ClientArgs,

    /// Path to the typed data JSON.
    path: ExpandedPathBuf,

    /// Always wrap the signature in an ERC-6492 envelope.
    #[clap(long)]
    erc6492: bool,
}

#[async_trait]
impl ClientCommand for SignTypedDataCommand {
    fn client_args(&self) -> &ClientArgs {
        &self.client
    }

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()> {
        let typed_data: TypedData = serde_json::from_str(&fs::read_to_string(&self.path)?)?;
        let signature = if self.erc6492 {
            client.sign_typed_data_with_6492(&typed_data).await?
        } else {
            client.sign_typed_data(&typed_data).await?
        };
        println!("{signature}");
        Ok(())
    }
}

/// Transfer the ownership of the account
#[derive(Debug, Parser)]
pub struct TransferOwnershipCommand {
    #[clap(flatten)]
    client: ClientArgs,

    #[clap(flatten)]
    overrides: OverrideArgs,

    #[clap(long, value_parser = parse_address)]
    new_owner: Address,

    /// Wait for the user operation to be mined.
    #[clap(long)]
    wait: bool,
}

#[async_trait]
impl ClientCommand for TransferOwnershipCommand {
    fn client_args(&self) -> &ClientArgs {
        &self.client
    }

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()> {
        let overrides = self.overrides.overrides();
        let submission = client.transfer_ownership(self.new_owner, &overrides, self.wait).await?;
        print_submission(&submission)
    }
}

/// Upgrade the account to a new implementation
#[derive(Debug, Parser)]
pub struct UpgradeCommand {
    #[clap(flatten)]
    client: ClientArgs,

    #[clap(flatten)]
    overrides: OverrideArgs,

    #[clap(long, value_parser = parse_address)]
    implementation: Address,

    /// Call made on the new implementation right after the upgrade.
    #[clap(long, default_value = "0x", value_parser = parse_bytes)]
    init_data: Bytes,

    /// Wait for the user operation to be mined.
    #[clap(long)]
    wait: bool,
}

#[async_trait]
impl ClientCommand for UpgradeCommand {
    fn client_args(&self) -> &ClientArgs {
        &self.client
    }

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()> {
        let submission = client
            .upgrade_account(
                self.implementation,
                self.init_data.clone(),
                &self.overrides.overrides(),
                self.wait,
            )
            .await?;
        print_submission(&submission)
    }
}

/// Start the account JSON-RPC server
#[derive(Debug, Parser)]
pub struct RpcCommand {
    #[clap(flatten)]
    client: ClientArgs,

    #[clap(flatten)]
    rpc: RpcArgs,
}

#[async_trait]
impl ClientCommand for RpcCommand {
    fn client_args(&self) -> &ClientArgs {
        &self.client
    }

    async fn run<M: Middleware + 'static>(
        &self,
        client: SmartAccountClient<M, LocalWallet>,
    ) -> eyre::Result<()> {
        info!("Starting account JSON-RPC server for {:?}...", client.address());

        let mut server = JsonRpcServer::new(self.rpc.listen_address());
        server.add_methods(AccountApiServerImpl::new(Arc::new(client)).into_rpc())?;

        let (_, handle) = server.start().await?;
        handle.stopped().await;
        Ok(())
    }
}

/// Create a new owner and store its mnemonic phrase
#[derive(Debug, Parser)]
pub struct CreateWalletCommand {
    /// Directory the mnemonic phrase is written to.
    #[clap(long)]
    output_path: ExpandedPathBuf,

    #[clap(long, default_value_t = 1)]
    chain_id: u64,
}

impl CreateWalletCommand {
    pub fn execute(self) -> eyre::Result<()> {
        let owner = crate::wallet::create(&self.output_path, self.chain_id)?;
        println!("{:?}", owner.address());
        Ok(())
    }
}
