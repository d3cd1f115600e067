use std::sync::Once;

use kda_common::{DerivationPath, Deriver, KeyPair};

pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub const DEFAULT_SPECULOS_MNEMONIC: &str = "glory promote mansion idle axis finger extra february uncover one trip resource lawn turtle enact monster seven myth punch hobby comfort wild raise skin";

// Keys returned by the device running with the speculos seed, `SwSigner` derives the same
pub const FIXTURE_PATH_0: &str = "44'/626'/0";
pub const FIXTURE_PUBKEY_0: &str =
    "3f6f820616c6d999667deca91a0eccf25f62e2c910a4e77e811241445db888d7";
pub const FIXTURE_PATH_1: &str = "44'/626'/1";
pub const FIXTURE_PUBKEY_1: &str =
    "10f26b7f3a51d6b9ebbff3a58a5b79fcdef154cbb1fb865af2ee55089a2a1d4f";
pub const FIXTURE_ADDRESS_1: &str =
    "k:10f26b7f3a51d6b9ebbff3a58a5b79fcdef154cbb1fb865af2ee55089a2a1d4f";

/// A deriver that always fails, to exercise the internal error path
#[derive(Debug, Default)]
pub struct FailingDeriver;

impl Deriver for FailingDeriver {
    type Error = String;

    fn derive(&self, path: &DerivationPath) -> Result<KeyPair, Self::Error> {
        Err(format!("secure element unavailable while deriving {path}"))
    }
}

static INIT: Once = Once::new();

/// Install a tracing subscriber honoring `RUST_LOG`, only the first call has effect
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        tracing::debug!("test logging initialized");
    });
}
