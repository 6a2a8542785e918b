//! Call data of the LightAccount entry functions
//!
//! Every function takes the [Selectors] of the account version, the arguments are encoded with
//! the standard ABI rules (head/tail layout, 32-byte aligned offsets).

use crate::error::AccountError;
use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, Selector, U256},
};
use lightkit_primitives::{CallData, Selectors, UserOperationCallData};

fn with_selector(selector: Selector, tokens: &[Token]) -> Bytes {
    [&selector[..], &encode(tokens)[..]].concat().into()
}

/// `execute(address dest, uint256 value, bytes func)`
pub fn encode_execute(selectors: &Selectors, call: &CallData) -> Bytes {
    with_selector(
        selectors.execute,
        &[
            Token::Address(call.target),
            Token::Uint(call.value.unwrap_or_default()),
            Token::Bytes(call.data.to_vec()),
        ],
    )
}

/// `executeBatch(address[] dest, uint256[] value, bytes[] func)` from parallel arrays
pub fn encode_batch_execute_parts(
    selectors: &Selectors,
    targets: &[Address],
    values: &[U256],
    data: &[Bytes],
) -> Result<Bytes, AccountError> {
    if targets.len() != values.len() || targets.len() != data.len() {
        return Err(AccountError::encoding(
            selectors.execute_batch,
            format!(
                "batch arrays have different lengths (targets {}, values {}, data {})",
                targets.len(),
                values.len(),
                data.len()
            ),
        ));
    }

    Ok(with_selector(
        selectors.execute_batch,
        &[
            Token::Array(targets.iter().map(|t| Token::Address(*t)).collect()),
            Token::Array(values.iter().map(|v| Token::Uint(*v)).collect()),
            Token::Array(data.iter().map(|d| Token::Bytes(d.to_vec())).collect()),
        ],
    ))
}

/// `executeBatch` of ordered calls, missing values are 0
pub fn encode_batch_execute(
    selectors: &Selectors,
    calls: &[CallData],
) -> Result<Bytes, AccountError> {
    if calls.is_empty() {
        return Err(AccountError::encoding(selectors.execute_batch, "batch has no calls"));
    }

    let targets = calls.iter().map(|c| c.target).collect::<Vec<_>>();
    let values = calls.iter().map(|c| c.value.unwrap_or_default()).collect::<Vec<_>>();
    let data = calls.iter().map(|c| c.data.clone()).collect::<Vec<_>>();
    encode_batch_execute_parts(selectors, &targets, &values, &data)
}

/// `transferOwnership(address newOwner)`
pub fn encode_transfer_ownership(selectors: &Selectors, new_owner: Address) -> Bytes {
    with_selector(selectors.transfer_ownership, &[Token::Address(new_owner)])
}

/// `upgradeToAndCall(address newImplementation, bytes data)`
pub fn encode_upgrade_to_and_call(
    selectors: &Selectors,
    implementation: Address,
    init_data: &Bytes,
) -> Bytes {
    with_selector(
        selectors.upgrade_to_and_call,
        &[Token::Address(implementation), Token::Bytes(init_data.to_vec())],
    )
}

/// Call data of a user operation
pub fn encode_call_data(
    selectors: &Selectors,
    call_data: &UserOperationCallData,
) -> Result<Bytes, AccountError> {
    match call_data {
        UserOperationCallData::Single(call) => Ok(encode_execute(selectors, call)),
        UserOperationCallData::Batch(calls) => encode_batch_execute(selectors, calls),
        UserOperationCallData::Raw(data) => {
            // anything shorter than a selector can't reach the account
            if !data.is_empty() && data.len() < 4 {
                return Err(AccountError::encoding(
                    selectors.execute,
                    format!("raw call data {data} is shorter than a selector"),
                ));
            }
            Ok(data.clone())
        }
    }
}
