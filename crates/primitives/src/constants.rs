//! LightAccount and account abstraction (ERC-4337)-related constants

/// Entry point smart contracts
pub mod entry_point {
    /// Address of the entry point v0.6 smart contract
    pub const ADDRESS_V0_6: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Address of the entry point v0.7 smart contract
    pub const ADDRESS_V0_7: &str = "0x0000000071727De22E5E9d8BAf0edAc6f37da032";
}

/// LightAccount deployments (factory and implementation per version)
pub mod light_account {
    pub const FACTORY_V1_0_1: &str = "0x000000893A26168158fbeaDD9335Be5bC96592E2";
    pub const IMPLEMENTATION_V1_0_1: &str = "0xc1b2fc4197c9187853243e6e4eb5a4af8879a1c0";

    pub const FACTORY_V1_0_2: &str = "0x00000055C0b4fA41dde26A74435ff03692292FBD";
    pub const IMPLEMENTATION_V1_0_2: &str = "0x5467b1947F47d0646704EB801E075e72aeAe8113";

    pub const FACTORY_V1_1_0: &str = "0x00004EC70002a32400f8ae005A26081065620D20";
    pub const IMPLEMENTATION_V1_1_0: &str = "0xae8c656ad28F2B59a196AB61815C16A0AE1c3cba";

    pub const FACTORY_V2_0_0: &str = "0x0000000000400CdFef5E2714E63d8040b700BC24";
    pub const IMPLEMENTATION_V2_0_0: &str = "0x8E8e658E22B12ada97B402fF0b044D6A325013C7";

    /// Name used in the EIP-712 domain of `LightAccountMessage`
    pub const DOMAIN_NAME: &str = "LightAccount";

    /// Placeholder signature used for gas estimation (v1.x)
    pub const DUMMY_SIGNATURE_V1: &str = "0xfffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c";
    /// Placeholder signature used for gas estimation (v2.x, prefixed with the EOA signature type)
    pub const DUMMY_SIGNATURE_V2: &str = "0x00fffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c";

    /// v2 signature type byte for signatures produced by the EOA owner
    pub const SIGNATURE_TYPE_EOA: u8 = 0x00;
}

/// ERC-6492 (signature validation for predeploy contracts)
pub mod erc6492 {
    /// Magic suffix appended to wrapped signatures
    pub const MAGIC_BYTES: [u8; 32] = [
        0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64,
        0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92, 0x64, 0x92,
        0x64, 0x92,
    ];
}

/// Nonce layout of the entry point (192-bit key, 64-bit sequence)
pub mod nonce {
    /// Bits taken by the sequence part of the nonce
    pub const SEQUENCE_BITS: usize = 64;
    /// Maximum width of the nonce key
    pub const KEY_BITS: usize = 192;
}

/// Fee estimation and replacement
pub mod fees {
    /// Percentage increase of fees required to replace a pending user operation
    pub const GAS_INCREASE_PERC: u64 = 10;
    /// Default buffer added on top of the latest base fee (in percent)
    pub const BASE_FEE_BUFFER_PERC: u64 = 50;
}

/// Receipt polling
pub mod wait {
    /// Default timeout for waiting on a user operation receipt (in milliseconds)
    pub const TIMEOUT_MS: u64 = 60_000;
    /// Default initial polling interval (in milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 2_000;
    /// Default multiplier applied to the polling interval after each miss (in percent)
    pub const INTERVAL_MULTIPLIER_PERC: u64 = 150;
}

/// RPC
pub mod rpc {
    /// The default port of the account RPC server
    pub const HTTP_PORT: u16 = 3000;
}

/// JSON-RPC error codes returned by the account RPC server
pub mod rpc_error_codes {
    pub const UNKNOWN_VERSION: i32 = -32001;
    pub const UNSUPPORTED_OPERATION: i32 = -32002;
    pub const ENCODING: i32 = -32003;
    pub const MIDDLEWARE_STAGE: i32 = -32004;
    pub const SUBMISSION_REJECTED: i32 = -32005;
    pub const OPERATION_DROPPED: i32 = -32006;
}
