//! Version registry of LightAccount
//!
//! Every version-dependent behavior of the client (dummy signature, message signing scheme,
//! selectors, entry point, counterfactual address derivation) is read from a
//! [VersionDescriptor] resolved here. Descriptors are immutable process-wide data.

use crate::{
    constants::light_account::{
        DUMMY_SIGNATURE_V1, DUMMY_SIGNATURE_V2, FACTORY_V1_0_1, FACTORY_V1_0_2, FACTORY_V1_1_0,
        FACTORY_V2_0_0, IMPLEMENTATION_V1_0_1, IMPLEMENTATION_V1_0_2, IMPLEMENTATION_V1_1_0,
        IMPLEMENTATION_V2_0_0, SIGNATURE_TYPE_EOA,
    },
    entry_point::EntryPointVersion,
};
use ethers::types::{Address, Bytes, Selector};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Version registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The version tag doesn't match any known LightAccount version
    #[error("Unknown LightAccount version {version}")]
    Unknown {
        /// The unrecognized tag
        version: String,
    },
}

/// Logical LightAccount version tag
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
)]
pub enum AccountVersion {
    #[strum(serialize = "v1.0.1")]
    #[serde(rename = "v1.0.1")]
    V1_0_1,
    #[strum(serialize = "v1.0.2")]
    #[serde(rename = "v1.0.2")]
    V1_0_2,
    #[strum(serialize = "v1.1.0")]
    #[serde(rename = "v1.1.0")]
    V1_1_0,
    #[strum(serialize = "v2.0.0")]
    #[serde(rename = "v2.0.0")]
    V2_0_0,
}

impl Default for AccountVersion {
    fn default() -> Self {
        Self::V1_1_0
    }
}

impl AccountVersion {
    /// Descriptor of this version
    pub fn descriptor(&self) -> &'static VersionDescriptor {
        match self {
            AccountVersion::V1_0_1 => &V1_0_1,
            AccountVersion::V1_0_2 => &V1_0_2,
            AccountVersion::V1_1_0 => &V1_1_0,
            AccountVersion::V2_0_0 => &V2_0_0,
        }
    }
}

/// How an account of a given version validates ERC-1271 signatures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageSigning {
    /// The owner's EIP-191 or EIP-712 signature is checked as is
    Raw,
    /// The account can't validate signatures on behalf of the owner
    Unsupported,
    /// The owner signs the EIP-712 struct `LightAccountMessage(bytes message)` whose message is
    /// the hash of the original payload
    TypedWrapper {
        /// Version field of the EIP-712 domain
        domain_version: &'static str,
    },
}

/// How the counterfactual address of an account is computed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressDerivation {
    /// Ask the entry point (`getSenderAddress` reverts with the address)
    EntryPointQuery,
    /// CREATE2 of an ERC-1967 minimal proxy with salt `keccak256(abi.encode(owner, salt))`
    Erc1967Proxy,
}

/// Function selectors of the account contract
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selectors {
    /// `execute(address,uint256,bytes)`
    pub execute: Selector,
    /// `executeBatch(address[],uint256[],bytes[])`
    pub execute_batch: Selector,
    /// `transferOwnership(address)`
    pub transfer_ownership: Selector,
    /// `upgradeToAndCall(address,bytes)`
    pub upgrade_to_and_call: Selector,
}

/// Selectors shared by all LightAccount versions
pub const LIGHT_ACCOUNT_SELECTORS: Selectors = Selectors {
    execute: [0xb6, 0x1d, 0x27, 0xf6],
    execute_batch: [0x47, 0xe1, 0xda, 0x2a],
    transfer_ownership: [0xf2, 0xfd, 0xe3, 0x8b],
    upgrade_to_and_call: [0x4f, 0x1e, 0xf2, 0x86],
};

/// Immutable description of one account version
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionDescriptor {
    pub version: AccountVersion,
    pub entry_point: EntryPointVersion,
    pub factory: Address,
    pub implementation: Address,
    /// Fixed-length placeholder signature (gas estimation only)
    pub dummy_signature: Bytes,
    pub message_signing: MessageSigning,
    /// Signature type byte the account expects in front of the owner's signature
    pub signature_prefix: Option<u8>,
    pub selectors: Selectors,
    pub address_derivation: AddressDerivation,
}

impl VersionDescriptor {
    /// Whether the account can validate ERC-1271 signatures
    pub fn supports_1271(&self) -> bool {
        self.message_signing != MessageSigning::Unsupported
    }

    /// Address of the entry point the version is deployed against
    pub fn entry_point_address(&self) -> Address {
        self.entry_point.address()
    }
}

fn parse_address(addr: &str) -> Address {
    addr.parse().expect("valid address in version registry")
}

fn parse_bytes(bytes: &str) -> Bytes {
    bytes.parse().expect("valid bytes in version registry")
}

lazy_static! {
    static ref V1_0_1: VersionDescriptor = VersionDescriptor {
        version: AccountVersion::V1_0_1,
        entry_point: EntryPointVersion::V0_6,
        factory: parse_address(FACTORY_V1_0_1),
        implementation: parse_address(IMPLEMENTATION_V1_0_1),
        dummy_signature: parse_bytes(DUMMY_SIGNATURE_V1),
        message_signing: MessageSigning::Raw,
        signature_prefix: None,
        selectors: LIGHT_ACCOUNT_SELECTORS,
        address_derivation: AddressDerivation::EntryPointQuery,
    };
    static ref V1_0_2: VersionDescriptor = VersionDescriptor {
        version: AccountVersion::V1_0_2,
        entry_point: EntryPointVersion::V0_6,
        factory: parse_address(FACTORY_V1_0_2),
        implementation: parse_address(IMPLEMENTATION_V1_0_2),
        dummy_signature: parse_bytes(DUMMY_SIGNATURE_V1),
        message_signing: MessageSigning::Unsupported,
        signature_prefix: None,
        selectors: LIGHT_ACCOUNT_SELECTORS,
        address_derivation: AddressDerivation::EntryPointQuery,
    };
    static ref V1_1_0: VersionDescriptor = VersionDescriptor {
        version: AccountVersion::V1_1_0,
        entry_point: EntryPointVersion::V0_6,
        factory: parse_address(FACTORY_V1_1_0),
        implementation: parse_address(IMPLEMENTATION_V1_1_0),
        dummy_signature: parse_bytes(DUMMY_SIGNATURE_V1),
        message_signing: MessageSigning::TypedWrapper { domain_version: "1" },
        signature_prefix: None,
        selectors: LIGHT_ACCOUNT_SELECTORS,
        address_derivation: AddressDerivation::EntryPointQuery,
    };
    static ref V2_0_0: VersionDescriptor = VersionDescriptor {
        version: AccountVersion::V2_0_0,
        entry_point: EntryPointVersion::V0_7,
        factory: parse_address(FACTORY_V2_0_0),
        implementation: parse_address(IMPLEMENTATION_V2_0_0),
        dummy_signature: parse_bytes(DUMMY_SIGNATURE_V2),
        message_signing: MessageSigning::TypedWrapper { domain_version: "2" },
        signature_prefix: Some(SIGNATURE_TYPE_EOA),
        selectors: LIGHT_ACCOUNT_SELECTORS,
        address_derivation: AddressDerivation::Erc1967Proxy,
    };
}

/// Resolves a version tag (e.g. `v1.1.0`) to its descriptor
pub fn resolve(version: &str) -> Result<&'static VersionDescriptor, VersionError> {
    AccountVersion::from_str(version)
        .map(|v| v.descriptor())
        .map_err(|_| VersionError::Unknown { version: version.into() })
}
