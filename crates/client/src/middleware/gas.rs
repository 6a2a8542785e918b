use super::{MiddlewareContext, UserOperationMiddleware};
use crate::error::{rpc_error_message, ClientError};
use ethers::{providers::Middleware, signers::Signer};
use lightkit_primitives::{
    utils::{pack_paymaster_data, unpack_paymaster_data},
    EntryPointVersion, UserOperationOverrides, UserOperationRequest,
};
use tracing::debug;

const NAME: &str = "gas-estimator";

/// Gas limits from `eth_estimateUserOperationGas`
#[derive(Clone, Copy, Debug, Default)]
pub struct GasEstimatorMiddleware;

#[async_trait::async_trait]
impl<M: Middleware + 'static, S: Signer> UserOperationMiddleware<M, S> for GasEstimatorMiddleware {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_overridden(&self, overrides: &UserOperationOverrides) -> bool {
        overrides.gas_pinned()
    }

    async fn populate(
        &self,
        uo: &mut UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<(), ClientError> {
        if uo.signature.is_empty() {
            uo.signature = ctx.account.dummy_signature();
        }

        let estimation = ctx
            .bundler
            .estimate_user_operation_gas(uo.to_rpc(ctx.entry_point_version()), ctx.entry_point())
            .await
            .map_err(|err| ClientError::stage(NAME, uo.nonce, rpc_error_message(&err)))?;
        debug!("Gas estimation for {:?}: {estimation:?}", uo.sender);

        uo.call_gas_limit = estimation.call_gas_limit;
        uo.verification_gas_limit = estimation.verification_gas_limit;
        uo.pre_verification_gas = estimation.pre_verification_gas;

        // entry point v0.7 estimates the paymaster verification separately
        if let (EntryPointVersion::V0_7, Some(paymaster_verification_gas_limit)) =
            (ctx.entry_point_version(), estimation.paymaster_verification_gas_limit)
        {
            if let Some((paymaster, _, post_op_gas_limit, data)) =
                unpack_paymaster_data(&uo.paymaster_and_data)
            {
                uo.paymaster_and_data = pack_paymaster_data(
                    paymaster,
                    paymaster_verification_gas_limit,
                    post_op_gas_limit,
                    &data,
                );
            }
        }

        Ok(())
    }
}
