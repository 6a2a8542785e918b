use jsonrpsee::types::{error::ErrorCode, ErrorObject, ErrorObjectOwned};
use lightkit_account::AccountError;
use lightkit_client::ClientError;
use lightkit_primitives::constants::rpc_error_codes::{
    ENCODING, MIDDLEWARE_STAGE, OPERATION_DROPPED, SUBMISSION_REJECTED, UNKNOWN_VERSION,
    UNSUPPORTED_OPERATION,
};
use serde_json::json;

/// A wrapper for the [ErrorObjectOwned](ErrorObjectOwned) type.
pub struct JsonRpcError(pub ErrorObjectOwned);

impl From<JsonRpcError> for ErrorObjectOwned {
    fn from(err: JsonRpcError) -> Self {
        err.0
    }
}

impl From<AccountError> for JsonRpcError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        JsonRpcError(match err {
            AccountError::UnknownVersion(_) => {
                ErrorObject::owned(UNKNOWN_VERSION, message, None::<bool>)
            }
            AccountError::UnsupportedOperation { version, capability } => ErrorObject::owned(
                UNSUPPORTED_OPERATION,
                message,
                Some(json!({ "version": version, "capability": capability })),
            ),
            AccountError::Encoding { selector, .. } => {
                ErrorObject::owned(ENCODING, message, Some(json!({ "selector": selector })))
            }
            AccountError::Signer { .. }
            | AccountError::Provider { .. }
            | AccountError::EntryPoint(_) => {
                ErrorObject::owned(ErrorCode::InternalError.code(), message, None::<bool>)
            }
        })
    }
}

impl From<ClientError> for JsonRpcError {
    fn from(err: ClientError) -> Self {
        let message = err.to_string();
        JsonRpcError(match err {
            ClientError::Account(err) => return err.into(),
            ClientError::MiddlewareStage { stage, nonce, .. } => ErrorObject::owned(
                MIDDLEWARE_STAGE,
                message,
                Some(json!({ "stage": stage, "nonce": nonce })),
            ),
            ClientError::SubmissionRejected { code, nonce, .. } => ErrorObject::owned(
                SUBMISSION_REJECTED,
                message,
                Some(json!({ "code": code, "nonce": nonce })),
            ),
            ClientError::OperationDropped { hash, nonce, .. } => ErrorObject::owned(
                OPERATION_DROPPED,
                message,
                Some(json!({ "userOpHash": hash, "nonce": nonce })),
            ),
            ClientError::Provider { .. } => {
                ErrorObject::owned(ErrorCode::InternalError.code(), message, None::<bool>)
            }
        })
    }
}
