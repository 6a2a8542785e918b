//! Misc utils (packing, nonce layout, counterfactual addresses)

use crate::constants::nonce::{KEY_BITS, SEQUENCE_BITS};
use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, H256, U128, U256},
    utils::{get_create2_address_from_hash, keccak256, to_checksum},
};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// Converts Option address to checksum
pub fn as_checksum_addr_opt<S>(val: &Option<Address>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if let Some(addr) = val {
        s.serialize_str(&to_checksum(addr, None))
    } else {
        s.serialize_none()
    }
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Splits entry point v0.7 `paymasterAndData` into paymaster, verification gas limit, post-op
/// gas limit and paymaster data
pub fn unpack_paymaster_data(buf: &[u8]) -> Option<(Address, U256, U256, Bytes)> {
    if buf.len() >= 52 {
        let (paymaster_verification_gas_limit, paymaster_post_op_gas_limit) =
            unpack_uint128(&buf[20..52]);
        Some((
            Address::from_slice(&buf[0..20]),
            paymaster_verification_gas_limit,
            paymaster_post_op_gas_limit,
            Bytes::from(buf[52..].to_vec()),
        ))
    } else {
        None
    }
}

/// Packs entry point v0.7 paymaster fields into `paymasterAndData`
pub fn pack_paymaster_data(
    addr: Address,
    paymaster_verification_gas_limit: U256,
    paymaster_post_op_gas_limit: U256,
    paymaster_data: &Bytes,
) -> Bytes {
    if addr.is_zero() {
        Bytes::default()
    } else {
        let gas_data = pack_uint128(paymaster_verification_gas_limit, paymaster_post_op_gas_limit);
        [addr.as_bytes(), &gas_data[..], paymaster_data.as_ref()].concat().into()
    }
}

/// Packs factory address and factory call data into init code
pub fn pack_factory_data(factory: Address, factory_data: &Bytes) -> Bytes {
    if factory.is_zero() {
        Bytes::default()
    } else {
        [factory.as_bytes(), factory_data.as_ref()].concat().into()
    }
}

/// Splits init code into factory address and factory call data
pub fn unpack_factory_data(init_code: &[u8]) -> Option<(Address, Bytes)> {
    if init_code.len() >= 20 {
        Some((Address::from_slice(&init_code[0..20]), Bytes::from(init_code[20..].to_vec())))
    } else {
        None
    }
}

/// Packs two uint128
pub fn pack_uint128(a: U256, b: U256) -> [u8; 32] {
    let mut res = [0u8; 32];
    let a: U128 = {
        let mut tem = [0; 32];
        a.to_big_endian(&mut tem);
        U128::from_big_endian(&tem[16..32])
    };
    let b: U128 = {
        let mut tem = [0; 32];
        b.to_big_endian(&mut tem);
        U128::from_big_endian(&tem[16..32])
    };
    a.to_big_endian(&mut res[0..16]);
    b.to_big_endian(&mut res[16..32]);
    res
}

/// Unpacks two uint128 from bytes
pub fn unpack_uint128(buf: &[u8]) -> (U256, U256) {
    (U256::from_big_endian(&buf[0..16]), U256::from_big_endian(&buf[16..32]))
}

/// Places `key` in the 192 high-order bits of the nonce, keeping the 64-bit sequence of
/// `sequence`. Returns `None` if the key doesn't fit in 192 bits.
pub fn compose_nonce(key: U256, sequence: U256) -> Option<U256> {
    if key.bits() > KEY_BITS {
        return None;
    }
    let sequence_mask = (U256::one() << SEQUENCE_BITS) - 1;
    Some((key << SEQUENCE_BITS) | (sequence & sequence_mask))
}

/// Key part of the nonce
pub fn nonce_key(nonce: U256) -> U256 {
    nonce >> SEQUENCE_BITS
}

/// CREATE2 address (EIP-1014) of a contract deployed by `deployer`
pub fn create2_address(deployer: Address, salt: H256, init_code_hash: H256) -> Address {
    get_create2_address_from_hash(deployer, salt.as_bytes(), init_code_hash.as_bytes())
}

/// Init code of the ERC-1967 minimal proxy pointing to `implementation`
pub fn erc1967_proxy_init_code(implementation: Address) -> Bytes {
    const PREFIX: [u8; 9] = [0x60, 0x3d, 0x3d, 0x81, 0x60, 0x22, 0x3d, 0x39, 0x73];
    const CONSTRUCTOR_TAIL: [u8; 2] = [0x60, 0x09];
    const RUNTIME: [u8; 64] = [
        0x51, 0x55, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d, 0x3d, 0x36, 0x3d, 0x7f, 0x36, 0x08, 0x94,
        0xa1, 0x3b, 0xa1, 0xa3, 0x21, 0x06, 0x67, 0xc8, 0x28, 0x49, 0x2d, 0xb9, 0x8d, 0xca, 0x3e,
        0x20, 0x76, 0xcc, 0x37, 0x35, 0xa9, 0x20, 0xa3, 0xca, 0x50, 0x5d, 0x38, 0x2b, 0xbc, 0x54,
        0x5a, 0xf4, 0x3d, 0x60, 0x00, 0x80, 0x3e, 0x60, 0x38, 0x57, 0x3d, 0x60, 0x00, 0xfd, 0x5b,
        0x3d, 0x60, 0x00, 0xf3,
    ];
    [&PREFIX[..], implementation.as_bytes(), &CONSTRUCTOR_TAIL[..], &RUNTIME[..]].concat().into()
}

/// Counterfactual address of an ERC-1967 proxy deployed by a factory that salts with
/// `keccak256(abi.encode(owner, salt))`
pub fn erc1967_proxy_address(
    factory: Address,
    implementation: Address,
    owner: Address,
    salt: U256,
) -> Address {
    let combined_salt = keccak256(encode(&[Token::Address(owner), Token::Uint(salt)]));
    let init_code_hash = keccak256(erc1967_proxy_init_code(implementation));
    create2_address(factory, combined_salt.into(), init_code_hash.into())
}

/// Increases value by the given percentage
pub fn increase_by_percent(value: U256, perc: u64) -> U256 {
    value.saturating_mul(U256::from(100 + perc)) / 100
}
