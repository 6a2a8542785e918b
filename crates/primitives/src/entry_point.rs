//! Entry point versions supported by LightAccount

use crate::constants::entry_point::{ADDRESS_V0_6, ADDRESS_V0_7};
use ethers::types::Address;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

lazy_static! {
    static ref ENTRY_POINT_V0_6: Address = ADDRESS_V0_6.parse().expect("valid entry point address");
    static ref ENTRY_POINT_V0_7: Address = ADDRESS_V0_7.parse().expect("valid entry point address");
}

/// Version of the entry point contract an account is bound to
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display,
)]
pub enum EntryPointVersion {
    #[strum(serialize = "0.6.0")]
    #[serde(rename = "0.6.0")]
    V0_6,
    #[strum(serialize = "0.7.0")]
    #[serde(rename = "0.7.0")]
    V0_7,
}

impl EntryPointVersion {
    /// Canonical deployment address of the entry point
    pub fn address(&self) -> Address {
        match self {
            EntryPointVersion::V0_6 => *ENTRY_POINT_V0_6,
            EntryPointVersion::V0_7 => *ENTRY_POINT_V0_7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn entry_point_addresses() {
        assert_eq!(
            EntryPointVersion::V0_6.address(),
            "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789".parse::<Address>().unwrap()
        );
        assert_eq!(
            EntryPointVersion::V0_7.address(),
            "0x0000000071727De22E5E9d8BAf0edAc6f37da032".parse::<Address>().unwrap()
        );
    }

    #[test]
    fn entry_point_version_from_str() {
        assert_eq!(EntryPointVersion::from_str("0.7.0").unwrap(), EntryPointVersion::V0_7);
        assert_eq!(EntryPointVersion::V0_6.to_string(), "0.6.0");
        assert!(EntryPointVersion::from_str("0.8.0").is_err());
    }
}
