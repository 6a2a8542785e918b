//! JSON-RPC server exposing a LightAccount smart account client

mod account;
mod account_api;
mod error;
mod rpc;

pub use account::AccountApiServerImpl;
pub use account_api::{AccountApiClient, AccountApiServer};
pub use error::JsonRpcError;
pub use rpc::JsonRpcServer;
