//! LightAccount smart account client
//!
//! Builds user operations through a pipeline of middleware stages (nonce, gas, fees, paymaster),
//! signs them with the account owner, submits them to a bundler and tracks them until they are
//! mined. Stuck user operations can be superseded with drop-and-replace.

pub mod bundler;
mod client;
pub mod config;
mod error;
pub mod middleware;
pub mod submission;

pub use client::SmartAccountClient;
pub use config::{ClientConfig, FeeOptions, PaymasterMode, PriorityFeeSource, WaitConfig};
pub use error::ClientError;
pub use submission::{SubmissionState, UserOperationSubmission};
