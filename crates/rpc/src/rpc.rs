use jsonrpsee::{
    server::{ServerBuilder, ServerHandle},
    Methods,
};
use std::net::SocketAddr;
use tracing::info;

/// JsonRpcServer is a wrapper around the `jsonrpsee` [ServerBuilder].
pub struct JsonRpcServer {
    /// The address to listen on.
    listen_address: String,
    /// The RPC methods to be exposed.
    methods: Methods,
}

impl JsonRpcServer {
    pub fn new(listen_address: String) -> Self {
        Self { listen_address, methods: Methods::new() }
    }

    /// Add methods to the RPC server.
    ///
    /// Fails if a method with the same name is already registered.
    pub fn add_methods(&mut self, methods: impl Into<Methods>) -> eyre::Result<()> {
        self.methods.merge(methods)?;
        Ok(())
    }

    /// Names of the exposed methods
    pub fn method_names(&self) -> Vec<&'static str> {
        self.methods.method_names().collect()
    }

    /// Start the [json RPC server](JsonRpcServer)
    ///
    /// # Returns
    /// * The address the server is bound to and the [handle](ServerHandle) of the server.
    pub async fn start(&self) -> eyre::Result<(SocketAddr, ServerHandle)> {
        let server = ServerBuilder::default().build(self.listen_address.as_str()).await?;
        let address = server.local_addr()?;
        info!("Account RPC server listening on {address}");

        Ok((address, server.start(self.methods.clone())))
    }
}
