use super::{MiddlewareContext, UserOperationMiddleware};
use crate::{
    bundler::FeeOverrides,
    error::{rpc_error_message, ClientError},
};
use ethers::{providers::Middleware, signers::Signer};
use lightkit_primitives::{UserOperationOverrides, UserOperationRequest};
use tracing::debug;

const ERC7677_STUB: &str = "erc7677-stub";
const ERC7677_DATA: &str = "erc7677-data";
const VENDOR_PAYMASTER: &str = "vendor-paymaster";

/// ERC-7677 `pm_getPaymasterStubData`, placeholder sponsorship for gas estimation
#[derive(Clone, Debug, Default)]
pub struct Erc7677StubMiddleware {
    pub context: Option<serde_json::Value>,
}

#[async_trait::async_trait]
impl<M: Middleware + 'static, S: Signer> UserOperationMiddleware<M, S> for Erc7677StubMiddleware {
    fn name(&self) -> &'static str {
        ERC7677_STUB
    }

    fn is_overridden(&self, overrides: &UserOperationOverrides) -> bool {
        overrides.bypass_paymaster()
    }

    async fn populate(
        &self,
        uo: &mut UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<(), ClientError> {
        if uo.signature.is_empty() {
            uo.signature = ctx.account.dummy_signature();
        }

        let stub = ctx
            .bundler
            .get_paymaster_stub_data(
                uo.to_rpc(ctx.entry_point_version()),
                ctx.entry_point(),
                ctx.account.chain_id(),
                self.context.clone(),
            )
            .await
            .map_err(|err| ClientError::stage(ERC7677_STUB, uo.nonce, rpc_error_message(&err)))?;

        uo.paymaster_and_data = stub.paymaster_and_data_over(&uo.paymaster_and_data);
        ctx.paymaster_final = stub.is_final;
        Ok(())
    }
}

/// ERC-7677 `pm_getPaymasterData`, the final sponsorship once gas and fees are known
#[derive(Clone, Debug, Default)]
pub struct Erc7677DataMiddleware {
    pub context: Option<serde_json::Value>,
}

#[async_trait::async_trait]
impl<M: Middleware + 'static, S: Signer> UserOperationMiddleware<M, S> for Erc7677DataMiddleware {
    fn name(&self) -> &'static str {
        ERC7677_DATA
    }

    fn is_overridden(&self, overrides: &UserOperationOverrides) -> bool {
        overrides.bypass_paymaster()
    }

    async fn populate(
        &self,
        uo: &mut UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<(), ClientError> {
        if ctx.paymaster_final {
            debug!("Paymaster stub data of {:?} is final", uo.sender);
            return Ok(());
        }

        let data = ctx
            .bundler
            .get_paymaster_data(
                uo.to_rpc(ctx.entry_point_version()),
                ctx.entry_point(),
                ctx.account.chain_id(),
                self.context.clone(),
            )
            .await
            .map_err(|err| ClientError::stage(ERC7677_DATA, uo.nonce, rpc_error_message(&err)))?;

        uo.paymaster_and_data = data.paymaster_and_data_over(&uo.paymaster_and_data);
        Ok(())
    }
}

/// `alchemy_requestGasAndPaymasterAndData`, gas limits and sponsorship in one call
///
/// Runs after the fee estimator, the estimated fees are the floor of the sponsor's fees.
#[derive(Clone, Debug, Default)]
pub struct VendorPaymasterMiddleware {
    pub policy_id: String,
}

#[async_trait::async_trait]
impl<M: Middleware + 'static, S: Signer> UserOperationMiddleware<M, S>
    for VendorPaymasterMiddleware
{
    fn name(&self) -> &'static str {
        VENDOR_PAYMASTER
    }

    fn is_overridden(&self, overrides: &UserOperationOverrides) -> bool {
        overrides.bypass_paymaster()
    }

    async fn populate(
        &self,
        uo: &mut UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<(), ClientError> {
        let dummy_signature = ctx.account.dummy_signature();
        if uo.signature.is_empty() {
            uo.signature = dummy_signature.clone();
        }

        let res = ctx
            .bundler
            .request_gas_and_paymaster_data(
                &self.policy_id,
                ctx.entry_point(),
                dummy_signature,
                uo.to_rpc(ctx.entry_point_version()),
                FeeOverrides {
                    max_fee_per_gas: uo.max_fee_per_gas,
                    max_priority_fee_per_gas: uo.max_priority_fee_per_gas,
                },
            )
            .await
            .map_err(|err| {
                ClientError::stage(VENDOR_PAYMASTER, uo.nonce, rpc_error_message(&err))
            })?;

        uo.paymaster_and_data = res.paymaster.paymaster_and_data_over(&uo.paymaster_and_data);
        uo.call_gas_limit = res.call_gas_limit;
        uo.verification_gas_limit = res.verification_gas_limit;
        uo.pre_verification_gas = res.pre_verification_gas;
        uo.max_fee_per_gas = res.max_fee_per_gas;
        uo.max_priority_fee_per_gas = res.max_priority_fee_per_gas;
        Ok(())
    }
}
