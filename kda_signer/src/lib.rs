//! Contains the software signer [`SwSigner`], the key derivation engine holding the device root
//! secret.
//!
//! Signers should implement [`kda_common::Deriver`]

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![warn(missing_docs)]

mod software;
pub use crate::software::{NewError, SwSigner};
pub use bip39;
