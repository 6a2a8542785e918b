use ethers::types::H256;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// User operation hash
#[derive(
    Eq, Hash, PartialEq, Debug, Serialize, Deserialize, Clone, Copy, Default, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct UserOperationHash(pub H256);

impl From<H256> for UserOperationHash {
    fn from(value: H256) -> Self {
        Self(value)
    }
}

impl From<[u8; 32]> for UserOperationHash {
    fn from(value: [u8; 32]) -> Self {
        Self(H256::from(value))
    }
}

impl From<UserOperationHash> for H256 {
    fn from(value: UserOperationHash) -> Self {
        value.0
    }
}

impl AsRef<[u8]> for UserOperationHash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for UserOperationHash {
    type Err = <H256 as FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        H256::from_str(s).map(Self)
    }
}

impl fmt::Display for UserOperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
