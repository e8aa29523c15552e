//! Encryption model: permissions, cipher options and the `Encrypt` value
//! attached to a document.
//!
//! The ciphers themselves run inside the engine layer; this module only
//! describes what a document allows and how it should be encrypted.

mod encrypt;
mod options;
mod permissions;

pub use encrypt::{Encrypt, EncryptInfo};
pub use options::{Algorithm, EncryptOptions, KeyLength};
pub use permissions::{Permission, Permissions};
