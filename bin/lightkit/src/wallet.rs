//! Owner wallet of the smart account
use ethers::{
    prelude::rand,
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
};
use expanded_pathbuf::ExpandedPathBuf;
use std::fs;
use tracing::info;

/// Derivation path of generated owners
const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Loads the owner from a file containing a mnemonic phrase
///
/// # Arguments
/// * `path` - The file holding the phrase
/// * `index` - Account index in the `m/44'/60'/0'/0` derivation path
/// * `chain_id` - Chain id used for signing transactions
pub fn from_mnemonic_file(
    path: &ExpandedPathBuf,
    index: u32,
    chain_id: u64,
) -> eyre::Result<LocalWallet> {
    let wallet = MnemonicBuilder::<English>::default()
        .phrase(path.to_path_buf())
        .index(index)?
        .build()?;
    Ok(wallet.with_chain_id(chain_id))
}

/// Loads the owner from a hex encoded private key
pub fn from_private_key(key: &str, chain_id: u64) -> eyre::Result<LocalWallet> {
    let wallet: LocalWallet = key.parse()?;
    Ok(wallet.with_chain_id(chain_id))
}

/// Generates a new owner and stores its mnemonic phrase in `dir`
pub fn create(dir: &ExpandedPathBuf, chain_id: u64) -> eyre::Result<LocalWallet> {
    fs::create_dir_all(dir)?;

    let mut rng = rand::thread_rng();
    let wallet = MnemonicBuilder::<English>::default()
        .write_to(dir.to_path_buf())
        .derivation_path(DERIVATION_PATH)?
        .build_random(&mut rng)?;
    info!("Created owner {:?} in {:?}", wallet.address(), dir);

    Ok(wallet.with_chain_id(chain_id))
}
