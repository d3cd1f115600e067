#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! A crate containing common code used in multiple other crate in the workspace, such as:
//!
//!  * [`DerivationPath`]: parse and encode hierarchical paths like `44'/626'/0`, in their textual
//!    and binary wire forms
//!  * [`PublicKey`] and [`Address`]: the only key material allowed to leave the device
//!  * [`Deriver`] trait: contains the methods to be implemented by a key derivation engine
//!
//!  To avoid circular dependencies this crate must not depend on other crate of the workspace

mod address;
mod error;
pub mod path;
mod signer;

pub use crate::address::{Address, PublicKey, ADDRESS_PREFIX};
pub use crate::error::{PathError, PublicKeyError};
pub use crate::path::{ChildIndex, DerivationPath, HARDENED};
pub use crate::signer::{Deriver, KeyPair};
