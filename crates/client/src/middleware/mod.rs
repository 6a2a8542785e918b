//! Middleware pipeline populating user operations
//!
//! Stages run strictly in order, later stages read the fields populated by earlier ones (fees
//! need gas limits, paymasters need fees). A stage whose fields are all pinned by the caller's
//! overrides is skipped, and the overrides are written last so they always win.

use crate::{bundler::BundlerClient, config::ClientConfig, error::ClientError};
use ethers::{providers::Middleware, signers::Signer, types::Address};
use lightkit_account::SmartAccount;
use lightkit_primitives::{EntryPointVersion, UserOperationOverrides, UserOperationRequest};
use tracing::{debug, trace};

mod fees;
mod gas;
mod nonce;
mod paymaster;

pub use fees::{estimate_fees, FeeEstimatorMiddleware};
pub use gas::GasEstimatorMiddleware;
pub use nonce::NonceMiddleware;
pub use paymaster::{Erc7677DataMiddleware, Erc7677StubMiddleware, VendorPaymasterMiddleware};

/// State shared by the stages of one pipeline run
pub struct MiddlewareContext<'a, M: Middleware + 'static, S: Signer> {
    pub account: &'a SmartAccount<M, S>,
    pub bundler: &'a BundlerClient<M>,
    pub config: &'a ClientConfig,
    pub overrides: &'a UserOperationOverrides,
    /// Set when the ERC-7677 stub data is already the final sponsorship
    pub paymaster_final: bool,
}

impl<'a, M: Middleware + 'static, S: Signer> MiddlewareContext<'a, M, S> {
    pub fn new(
        account: &'a SmartAccount<M, S>,
        bundler: &'a BundlerClient<M>,
        config: &'a ClientConfig,
        overrides: &'a UserOperationOverrides,
    ) -> Self {
        Self { account, bundler, config, overrides, paymaster_final: false }
    }

    pub fn entry_point_version(&self) -> EntryPointVersion {
        self.account.descriptor().entry_point
    }

    pub fn entry_point(&self) -> Address {
        self.account.descriptor().entry_point_address()
    }
}

/// One stage of the pipeline
#[async_trait::async_trait]
pub trait UserOperationMiddleware<M: Middleware + 'static, S: Signer>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the overrides pin every field the stage populates
    fn is_overridden(&self, _overrides: &UserOperationOverrides) -> bool {
        false
    }

    async fn populate(
        &self,
        uo: &mut UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<(), ClientError>;
}

/// Ordered stages
pub struct MiddlewarePipeline<M: Middleware + 'static, S: Signer> {
    stages: Vec<Box<dyn UserOperationMiddleware<M, S>>>,
}

impl<M: Middleware + 'static, S: Signer> Default for MiddlewarePipeline<M, S> {
    fn default() -> Self {
        Self { stages: vec![] }
    }
}

impl<M: Middleware + 'static, S: Signer> MiddlewarePipeline<M, S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage to the pipeline
    pub fn with_stage(mut self, stage: impl UserOperationMiddleware<M, S> + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs the stages in order
    pub async fn run(
        &self,
        mut uo: UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<UserOperationRequest, ClientError> {
        // stages see the pinned values
        ctx.overrides.apply(&mut uo);

        for stage in self.stages.iter() {
            if stage.is_overridden(ctx.overrides) {
                debug!("Skipping {} stage, all of its fields are overridden", stage.name());
                continue;
            }

            trace!("Running {} stage for {:?}", stage.name(), uo.sender);
            stage.populate(&mut uo, ctx).await?;
        }

        ctx.overrides.apply(&mut uo);
        Ok(uo)
    }
}
