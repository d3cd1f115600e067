use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::PublicKeyError;

/// Prefix of single-key ("k:") Kadena accounts.
pub const ADDRESS_PREFIX: &str = "k:";

/// An Ed25519 public key in its 32 bytes compressed form.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PublicKeyError> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PublicKeyError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The account address controlled by this key
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = PublicKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(&hex::decode(s)?)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A Kadena account address: [`ADDRESS_PREFIX`] followed by the hex public key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(format!("{ADDRESS_PREFIX}{}", public_key.to_hex()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY_1: &str = "10f26b7f3a51d6b9ebbff3a58a5b79fcdef154cbb1fb865af2ee55089a2a1d4f";

    #[test]
    fn address_from_public_key() {
        let pk: PublicKey = PUBKEY_1.parse().unwrap();
        assert_eq!(pk.to_string(), PUBKEY_1);
        let address = pk.address();
        assert_eq!(address.as_str(), format!("k:{PUBKEY_1}"));
        assert_eq!(address, Address::from_public_key(&pk));
        assert_eq!(
            serde_json::to_string(&address).unwrap(),
            format!("\"k:{PUBKEY_1}\"")
        );
        assert_eq!(
            serde_json::to_string(&pk).unwrap(),
            format!("\"{PUBKEY_1}\"")
        );
    }

    #[test]
    fn invalid_public_key() {
        assert_eq!(
            PublicKey::from_slice(&[0u8; 31]),
            Err(PublicKeyError::InvalidLength(31))
        );
        assert!(matches!(
            PublicKey::from_str("zz"),
            Err(PublicKeyError::Hex(_))
        ));
    }
}
