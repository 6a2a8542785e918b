use super::{MiddlewareContext, UserOperationMiddleware};
use crate::error::ClientError;
use ethers::{providers::Middleware, signers::Signer};
use lightkit_primitives::{utils::compose_nonce, UserOperationOverrides, UserOperationRequest};

const NAME: &str = "nonce";

/// Reads the account nonce from the entry point, in the namespace of the overridden nonce key
#[derive(Clone, Copy, Debug, Default)]
pub struct NonceMiddleware;

#[async_trait::async_trait]
impl<M: Middleware + 'static, S: Signer> UserOperationMiddleware<M, S> for NonceMiddleware {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_overridden(&self, overrides: &UserOperationOverrides) -> bool {
        overrides.nonce.is_some()
    }

    async fn populate(
        &self,
        uo: &mut UserOperationRequest,
        ctx: &mut MiddlewareContext<'_, M, S>,
    ) -> Result<(), ClientError> {
        let key = ctx.overrides.nonce_key.unwrap_or_default();
        if compose_nonce(key, Default::default()).is_none() {
            let message = format!("nonce key 0x{key:x} is wider than 192 bits");
            return Err(ClientError::stage(NAME, uo.nonce, message));
        }

        let nonce = ctx
            .account
            .get_nonce(key)
            .await
            .map_err(|err| ClientError::stage(NAME, uo.nonce, err.to_string()))?;

        // the key always ends up in the high-order bits, the sequence is kept as is
        uo.nonce = compose_nonce(key, nonce).unwrap_or(nonce);
        Ok(())
    }
}
