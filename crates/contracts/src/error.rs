use crate::gen::{EntryPointAPIErrors, FailedOp};
use ethers::{
    abi::AbiDecode,
    providers::{JsonRpcError, Middleware, MiddlewareError, ProviderError},
    types::Bytes,
};
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// `Error(string)`
const REVERT_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Entry point errors
#[derive(Debug, Error, Clone)]
pub enum EntryPointError {
    /// The entry point rejected the user operation
    #[error("{0}")]
    FailedOp(FailedOp),

    /// A call that returns its result through a revert didn't revert
    #[error("{function} should revert")]
    NoRevert { function: String },

    #[error("provider error: {message}")]
    Provider { message: String },

    /// Revert data doesn't match any entry point error
    #[error("decode error: {message}")]
    Decode { message: String },

    #[error("other error: {message}")]
    Other { message: String },
}

impl EntryPointError {
    fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into() }
    }

    /// Decodes the revert carried by a failed `eth_call`
    pub fn from_middleware_error<M: Middleware>(
        err: M::Error,
    ) -> Result<EntryPointAPIErrors, Self> {
        match err.as_error_response() {
            Some(err) => decode_revert(revert_data(err)?),
            None => match err.as_provider_error() {
                Some(err) => Self::from_provider_error(&err),
                None => Err(Self::Provider { message: format!("{err:?}") }),
            },
        }
    }

    pub fn from_provider_error(err: &ProviderError) -> Result<EntryPointAPIErrors, Self> {
        match err.as_error_response() {
            Some(err) => decode_revert(revert_data(err)?),
            None => Err(Self::Provider { message: err.to_string() }),
        }
    }
}

/// Revert data of a JSON-RPC error
///
/// Nodes either return the hex data as is or embed it in a message (`Reverted 0x...`).
pub fn revert_data(err: &JsonRpcError) -> Result<Bytes, EntryPointError> {
    let data = match &err.data {
        Some(serde_json::Value::String(data)) => data,
        Some(other) => {
            return Err(EntryPointError::decode(format!("revert data is not a string: {other}")))
        }
        None => {
            return Err(EntryPointError::Provider {
                message: format!("{} ({}) without revert data", err.message, err.code),
            })
        }
    };

    let re = Regex::new(r"0x[0-9a-fA-F]*").map_err(|e| EntryPointError::decode(e.to_string()))?;
    let hex = re
        .find(data)
        .ok_or_else(|| EntryPointError::decode(format!("no hex data in {data:?}")))?;
    Bytes::from_str(hex.as_str()).map_err(|e| EntryPointError::decode(format!("{data:?}: {e}")))
}

/// Reason of a `revert("reason")`
pub fn revert_reason(data: &Bytes) -> Option<String> {
    match data.get(..4) {
        Some(selector) if selector == REVERT_STRING_SELECTOR => {
            <String as AbiDecode>::decode(&data[4..]).ok()
        }
        _ => None,
    }
}

/// Decodes revert data into one of the entry point errors
pub fn decode_revert(data: Bytes) -> Result<EntryPointAPIErrors, EntryPointError> {
    if let Ok(decoded) = EntryPointAPIErrors::decode(data.as_ref()) {
        return Ok(decoded);
    }
    revert_reason(&data)
        .map(EntryPointAPIErrors::RevertString)
        .ok_or_else(|| EntryPointError::decode(format!("unknown entry point revert {data}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Address;

    const SENDER_ADDRESS_RESULT: &str =
        "0x6ca7b8060000000000000000000000009efdfcb56390edd8b2eae6dabc148ced3491aaf6";

    #[test]
    fn sender_address_result() -> eyre::Result<()> {
        match decode_revert(Bytes::from_str(SENDER_ADDRESS_RESULT)?)? {
            EntryPointAPIErrors::SenderAddressResult(res) => assert_eq!(
                res.sender,
                "0x9EfDfCB56390eDd8b2eAE6daBC148CED3491AAf6".parse::<Address>()?
            ),
            other => panic!("unexpected revert {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn failed_op() -> eyre::Result<()> {
        let data = Bytes::from_str("0x220266b600000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000040000000000000000000000000000000000000000000000000000000000000001e41413430206f76657220766572696669636174696f6e4761734c696d69740000")?;
        match decode_revert(data)? {
            EntryPointAPIErrors::FailedOp(op) => {
                assert_eq!(op.reason, "AA40 over verificationGasLimit")
            }
            other => panic!("unexpected revert {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn revert_string() -> eyre::Result<()> {
        let data = Bytes::from_str("0x08c379a00000000000000000000000000000000000000000000000000000000000000020000000000000000000000000000000000000000000000000000000000000001841413934206761732076616c756573206f766572666c6f770000000000000000")?;
        assert_eq!(revert_reason(&data), Some("AA94 gas values overflow".into()));
        assert!(matches!(
            decode_revert(data)?,
            EntryPointAPIErrors::RevertString(s) if s == "AA94 gas values overflow"
        ));
        assert_eq!(revert_reason(&Bytes::from_str("0x08")?), None);
        assert!(matches!(
            decode_revert(Bytes::from_str("0xdeadbeef")?),
            Err(EntryPointError::Decode { .. })
        ));
        Ok(())
    }

    #[test]
    fn json_rpc_revert_data() -> eyre::Result<()> {
        let err = JsonRpcError {
            code: 3,
            message: "execution reverted".into(),
            data: Some(serde_json::json!(format!("Reverted {SENDER_ADDRESS_RESULT}"))),
        };
        assert_eq!(revert_data(&err)?, Bytes::from_str(SENDER_ADDRESS_RESULT)?);

        let err = JsonRpcError { code: -32000, message: "boom".into(), data: None };
        assert!(matches!(revert_data(&err), Err(EntryPointError::Provider { .. })));

        let err = JsonRpcError { code: 3, message: "reverted".into(), data: Some(1.into()) };
        assert!(matches!(revert_data(&err), Err(EntryPointError::Decode { .. })));
        Ok(())
    }
}
