use zeroize::Zeroizing;

use crate::address::{Address, PublicKey};
use crate::path::DerivationPath;

/// A key pair derived for a single command.
///
/// The private scalar is wiped from memory when the pair is dropped and is never part of the
/// `Debug` output.
pub struct KeyPair {
    secret: Zeroizing<[u8; 32]>,
    public: PublicKey,
}

impl KeyPair {
    pub fn new(secret: [u8; 32], public: PublicKey) -> Self {
        Self {
            secret: Zeroizing::new(secret),
            public,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    pub fn address(&self) -> Address {
        self.public.address()
    }

    /// The private scalar, it must not leave the device
    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }
}

impl core::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "KeyPair({})", self.public)
    }
}

/// A trait defining the key derivation engine, providing blanket implementations for the
/// projections of the derived pair.
///
/// Implementors own the root secret: no other component may read or cache it.
pub trait Deriver {
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Derive the key pair at `path`, deterministic for a given root secret
    fn derive(&self, path: &DerivationPath) -> Result<KeyPair, Self::Error>;

    /// Return the public key at `path`
    fn public_key(&self, path: &DerivationPath) -> Result<PublicKey, Self::Error> {
        Ok(self.derive(path)?.public_key())
    }

    /// Return the address at `path`
    fn address(&self, path: &DerivationPath) -> Result<Address, Self::Error> {
        Ok(self.public_key(path)?.address())
    }
}

impl<D: Deriver + ?Sized> Deriver for &D {
    type Error = D::Error;

    fn derive(&self, path: &DerivationPath) -> Result<KeyPair, Self::Error> {
        (**self).derive(path)
    }
}
