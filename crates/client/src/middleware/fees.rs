use super::{MiddlewareContext, UserOperationMiddleware};
use crate::{
    bundler::BundlerClient,
    config::FeeOptions,
    error::{rpc_error_message, ClientError},
};
use ethers::{providers::Middleware, signers::Signer, types::U256};
use lightkit_primitives::{utils::increase_by_percent, UserOperationOverrides, UserOperationRequest};
use tracing::debug;

/// Fresh `(maxFeePerGas, maxPriorityFeePerGas)` estimate
///
/// `maxFeePerGas` is the latest base fee plus its buffer plus the priority fee, a pinned
/// priority fee replaces the estimated one.
pub async fn estimate_fees<M: Middleware + 'static>(
    bundler: &BundlerClient<M>,
    options: &FeeOptions,
    pinned_priority_fee: Option<U256>,
) -> Result<(U256, U256), String> {
    let base_fee = bundler.base_fee_per_gas().await.map_err(|err| rpc_error_message(&err))?;

    let max_priority_fee_per_gas = match pinned_priority_fee {
        Some(fee) => fee,
        None => {
            let fee = bundler
                .max_priority_fee_per_gas(options.priority_fee_source.method())
                .await
                .map_err(|err| rpc_error_message(&err))?;
            increase_by_percent(fee, options.priority_fee_buffer_percent)
        }
    };

    let max_fee_per_gas = increase_by_percent(base_fee, options.base_fee_buffer_percent)
        .saturating_add(max_priority_fee_per_gas);
    Ok((max_fee_per_gas, max_priority_fee_per_gas))
}

const NAME: &str = "fee-estimator";

/// `maxFeePerGas` / `maxPriorityFeePerGas` from the latest base fee and the priority fee source
#[derive(Clone, Copy, Debug, Default)]
pub struct FeeEstimatorMiddleware;

#[async_trait::async_trait]
impl<M: Middleware + 'static, S: Signer> UserOperationMiddleware<M, S> for FeeEstimatorMiddleware {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_overridden(&self, overrides: &UserOperationOverrides) -> bool {
        overrides.fees_pinned()
    }

    async fn populate(
        &self,
        uo: &mut UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<(), ClientError> {
        let (max_fee_per_gas, max_priority_fee_per_gas) = estimate_fees(
            ctx.bundler,
            &ctx.config.fee_options,
            ctx.overrides.max_priority_fee_per_gas,
        )
        .await
        .map_err(|message| ClientError::stage(NAME, uo.nonce, message))?;
        debug!(
            "Fees for {:?}: max fee {max_fee_per_gas}, priority fee {max_priority_fee_per_gas}",
            uo.sender
        );

        uo.max_fee_per_gas = max_fee_per_gas;
        uo.max_priority_fee_per_gas = max_priority_fee_per_gas;
        Ok(())
    }
}
