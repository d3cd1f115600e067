use bip39::Mnemonic;
use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use ed25519_dalek::SigningKey;
use hmac::{Hmac, Mac};
use kda_common::{ChildIndex, DerivationPath, Deriver, KeyPair, PublicKey};
use sha2::{Sha256, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// HMAC key used to expand the seed into the master node.
const ED25519_SEED_KEY: &[u8] = b"ed25519 seed";

/// Possible errors when creating a new software signer [`SwSigner`]
#[derive(thiserror::Error, Debug)]
pub enum NewError {
    /// Error parsing the mnemonic
    #[error(transparent)]
    Bip39(#[from] bip39::Error),
}

/// An extended private key of the hierarchical Ed25519 scheme: the 64 bytes `kL || kR` and the
/// chain code.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct ExtendedKey {
    kl: [u8; 32],
    kr: [u8; 32],
    chain_code: [u8; 32],
}

impl ExtendedKey {
    fn master(seed: &[u8]) -> Self {
        let mut i = hmac_sha512(ED25519_SEED_KEY, &[seed]);
        // the third highest bit of the last byte of kL must be zero
        while i[31] & 0x20 != 0 {
            i = hmac_sha512(ED25519_SEED_KEY, &[&i[..]]);
        }
        let mut key = Self {
            kl: [0u8; 32],
            kr: [0u8; 32],
            chain_code: [0u8; 32],
        };
        key.kl.copy_from_slice(&i[..32]);
        key.kr.copy_from_slice(&i[32..]);
        key.kl[0] &= 0xf8;
        key.kl[31] &= 0x7f;
        key.kl[31] |= 0x40;

        let chain_code = hmac_sha256(ED25519_SEED_KEY, &[&[0x01], seed]);
        key.chain_code.copy_from_slice(&chain_code[..]);
        key
    }

    /// `kL * B`, the point used to derive non-hardened children
    fn point(&self) -> [u8; 32] {
        let scalar = Zeroizing::new(Scalar::from_bytes_mod_order(self.kl));
        EdwardsPoint::mul_base(&scalar).compress().to_bytes()
    }

    fn derive_child(&self, child: ChildIndex) -> Self {
        let index = child.to_u32().to_le_bytes();
        let (z, c) = if child.is_hardened() {
            (
                hmac_sha512(&self.chain_code, &[&[0x00], &self.kl, &self.kr, &index]),
                hmac_sha512(&self.chain_code, &[&[0x01], &self.kl, &self.kr, &index]),
            )
        } else {
            let point = self.point();
            (
                hmac_sha512(&self.chain_code, &[&[0x02], &point, &index]),
                hmac_sha512(&self.chain_code, &[&[0x03], &point, &index]),
            )
        };

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&c[32..]);
        Self {
            kl: add_mul8(&self.kl, &z[..28]),
            kr: add_mod(&self.kr, &z[32..]),
            chain_code,
        }
    }

    fn derive_path(&self, path: &DerivationPath) -> Self {
        path.iter()
            .fold(self.clone(), |parent, child| parent.derive_child(*child))
    }
}

/// `kl + 8 * zl` where both are little-endian integers, modulo 2^256
fn add_mul8(kl: &[u8; 32], zl: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    for (i, out) in out.iter_mut().enumerate() {
        let z = zl.get(i).copied().unwrap_or(0) as u16;
        let r = kl[i] as u16 + (z << 3) + carry;
        *out = r as u8;
        carry = r >> 8;
    }
    out
}

/// `kr + zr` where both are little-endian integers, modulo 2^256
fn add_mod(kr: &[u8; 32], zr: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    for (i, out) in out.iter_mut().enumerate() {
        let r = kr[i] as u16 + zr.get(i).copied().unwrap_or(0) as u16 + carry;
        *out = r as u8;
        carry = r >> 8;
    }
    out
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Zeroizing<[u8; 64]> {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("hmac takes keys of any size");
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Zeroizing<[u8; 32]> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("hmac takes keys of any size");
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// A software signer, the holder of the device root secret.
///
/// Keys are derived with the hierarchical Ed25519 scheme used by Ledger devices: the derived
/// `kL` is the private key and the public key is computed from it as an Ed25519 secret.
#[derive(Clone)]
pub struct SwSigner {
    master: ExtendedKey,
}

impl core::fmt::Debug for SwSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SwSigner(<redacted>)")
    }
}

impl SwSigner {
    /// Creates a new software signer from the given mnemonic, with an empty passphrase.
    pub fn new(mnemonic: &str) -> Result<Self, NewError> {
        let mnemonic: Mnemonic = mnemonic.parse()?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));
        Ok(Self::from_seed(&seed[..]))
    }

    /// Creates a new software signer from a raw seed, as returned by BIP39
    pub fn from_seed(seed: &[u8]) -> Self {
        Self {
            master: ExtendedKey::master(seed),
        }
    }
}

impl Deriver for SwSigner {
    type Error = std::convert::Infallible;

    fn derive(&self, path: &DerivationPath) -> Result<KeyPair, Self::Error> {
        let derived = self.master.derive_path(path);
        let signing_key = SigningKey::from_bytes(&derived.kl);
        let public = PublicKey::from_bytes(signing_key.verifying_key().to_bytes());
        tracing::debug!("derived public key {public} at {path}");
        Ok(KeyPair::new(derived.kl, public))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kda_test_util::{
        DEFAULT_SPECULOS_MNEMONIC, FIXTURE_PATH_0, FIXTURE_PATH_1, FIXTURE_PUBKEY_0,
        FIXTURE_PUBKEY_1, TEST_MNEMONIC,
    };

    fn path(s: &str) -> DerivationPath {
        s.parse().unwrap()
    }

    #[test]
    fn new_signer() {
        let signer = SwSigner::new(TEST_MNEMONIC).unwrap();
        assert_eq!(format!("{:?}", signer), "SwSigner(<redacted>)");
        assert_eq!(
            "mnemonic has an invalid word count: 1. Word count must be 12, 15, 18, 21, or 24",
            SwSigner::new("bad").expect_err("test").to_string()
        );
    }

    #[test]
    fn master_is_clamped() {
        let signer = SwSigner::new(TEST_MNEMONIC).unwrap();
        let kl = signer.master.kl;
        assert_eq!(kl[0] & 0x07, 0);
        assert_eq!(kl[31] & 0x80, 0);
        assert_eq!(kl[31] & 0x40, 0x40);
        assert_eq!(kl[31] & 0x20, 0);
    }

    #[test]
    fn derivation_is_deterministic() {
        let signer = SwSigner::new(TEST_MNEMONIC).unwrap();
        let p = path("44'/626'/0");
        let a = signer.derive(&p).unwrap();
        let b = signer.derive(&p).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.secret_bytes(), b.secret_bytes());
        assert_eq!(signer.address(&p).unwrap(), a.address());

        let other = SwSigner::new(TEST_MNEMONIC).unwrap();
        assert_eq!(other.public_key(&p).unwrap(), a.public_key());
    }

    #[test]
    fn paths_lead_to_distinct_keys() {
        let signer = SwSigner::new(TEST_MNEMONIC).unwrap();
        let keys: Vec<PublicKey> = ["44'/626'/0", "44'/626'/1", "44'/626'/0'", "44'/626'"]
            .iter()
            .map(|p| signer.public_key(&path(p)).unwrap())
            .collect();
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }

        let speculos = SwSigner::new(DEFAULT_SPECULOS_MNEMONIC).unwrap();
        assert_ne!(
            speculos.public_key(&path("44'/626'/0")).unwrap(),
            keys[0]
        );
    }

    #[test]
    fn public_key_matches_secret() {
        let signer = SwSigner::new(TEST_MNEMONIC).unwrap();
        let pair = signer.derive(&path("44'/626'/7")).unwrap();
        let expected = SigningKey::from_bytes(pair.secret_bytes())
            .verifying_key()
            .to_bytes();
        assert_eq!(pair.public_key().as_bytes(), &expected);
        assert!(!format!("{pair:?}").contains(&hex::encode(pair.secret_bytes())));
    }

    #[test]
    fn scalar_arithmetic() {
        let mut kl = [0u8; 32];
        kl[0] = 1;
        let mut zl = [0u8; 28];
        zl[0] = 1;
        assert_eq!(add_mul8(&kl, &zl)[0], 9);

        kl[0] = 0xff;
        zl[0] = 0x20;
        let r = add_mul8(&kl, &zl);
        assert_eq!(r[0], 0xff);
        assert_eq!(r[1], 0x01);

        // 8 * zl never touches the highest byte beyond the carry
        let r = add_mul8(&[0u8; 32], &[0xff; 28]);
        assert_eq!(r[28], 0x07);
        assert_eq!(r[29], 0);

        let r = add_mod(&[0xff; 32], &{
            let mut one = [0u8; 32];
            one[0] = 1;
            one
        });
        assert_eq!(r, [0u8; 32]);
    }

    #[test]
    fn speculos_fixtures() {
        let signer = SwSigner::new(DEFAULT_SPECULOS_MNEMONIC).unwrap();
        assert_eq!(
            signer.public_key(&path(FIXTURE_PATH_0)).unwrap().to_hex(),
            FIXTURE_PUBKEY_0
        );
        assert_eq!(
            signer.public_key(&path(FIXTURE_PATH_1)).unwrap().to_hex(),
            FIXTURE_PUBKEY_1
        );
    }
}
