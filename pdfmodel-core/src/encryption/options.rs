use super::permissions::{Permission, Permissions};
use crate::error::{PdfError, Result};
use std::fmt;
use std::str::FromStr;

/// Cipher and security handler revision used to encrypt a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// RC4, revision 2, 40-bit keys only
    Rc4V1,
    /// RC4, revision 3, 40 to 128-bit keys
    Rc4V2,
    /// AES-128 through a crypt filter, revision 4
    AesV2,
    /// AES-256, revision 6
    AesV3,
}

impl Algorithm {
    /// `/V` entry of the encryption dictionary.
    pub fn version(self) -> i64 {
        match self {
            Algorithm::Rc4V1 => 1,
            Algorithm::Rc4V2 => 2,
            Algorithm::AesV2 => 4,
            Algorithm::AesV3 => 5,
        }
    }

    /// `/R` entry of the encryption dictionary.
    pub fn revision(self) -> i64 {
        match self {
            Algorithm::Rc4V1 => 2,
            Algorithm::Rc4V2 => 3,
            Algorithm::AesV2 => 4,
            Algorithm::AesV3 => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Rc4V1 => "rc4v1",
            Algorithm::Rc4V2 => "rc4v2",
            Algorithm::AesV2 => "aesv2",
            Algorithm::AesV3 => "aesv3",
        }
    }

    pub fn supports(self, key_length: KeyLength) -> bool {
        matches!(
            (self, key_length),
            (Algorithm::Rc4V1, KeyLength::Bits40)
                | (Algorithm::Rc4V2, KeyLength::Bits40 | KeyLength::Bits128)
                | (Algorithm::AesV2, KeyLength::Bits128)
                | (Algorithm::AesV3, KeyLength::Bits256)
        )
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rc4v1" => Ok(Algorithm::Rc4V1),
            "rc4v2" => Ok(Algorithm::Rc4V2),
            "aesv2" => Ok(Algorithm::AesV2),
            "aesv3" => Ok(Algorithm::AesV3),
            other => Err(PdfError::InvalidEncryptOptions(format!(
                "unknown algorithm '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyLength {
    Bits40,
    Bits128,
    Bits256,
}

impl KeyLength {
    pub fn bits(self) -> u32 {
        match self {
            KeyLength::Bits40 => 40,
            KeyLength::Bits128 => 128,
            KeyLength::Bits256 => 256,
        }
    }

    pub fn bytes(self) -> usize {
        self.bits() as usize / 8
    }
}

impl TryFrom<u32> for KeyLength {
    type Error = PdfError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            40 => Ok(KeyLength::Bits40),
            128 => Ok(KeyLength::Bits128),
            256 => Ok(KeyLength::Bits256),
            other => Err(PdfError::InvalidEncryptOptions(format!(
                "key length must be 40, 128 or 256 bits, got {other}"
            ))),
        }
    }
}

/// Settings for encrypting a document on its next write.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncryptOptions {
    pub owner_password: String,
    pub user_password: Option<String>,
    pub key_length: KeyLength,
    pub protection: Vec<Permission>,
    pub algorithm: Algorithm,
}

impl EncryptOptions {
    /// AES-128 with no grants and no user password.
    pub fn new(owner_password: impl Into<String>) -> Self {
        Self {
            owner_password: owner_password.into(),
            user_password: None,
            key_length: KeyLength::Bits128,
            protection: Vec::new(),
            algorithm: Algorithm::AesV2,
        }
    }

    pub fn user_password(mut self, password: impl Into<String>) -> Self {
        self.user_password = Some(password.into());
        self
    }

    pub fn key_length(mut self, key_length: KeyLength) -> Self {
        self.key_length = key_length;
        self
    }

    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn allow(mut self, permission: Permission) -> Self {
        if !self.protection.contains(&permission) {
            self.protection.push(permission);
        }
        self
    }

    pub fn allow_all(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        for permission in permissions {
            self = self.allow(permission);
        }
        self
    }

    pub fn permissions(&self) -> Permissions {
        self.protection.iter().copied().collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.owner_password.is_empty() {
            return Err(PdfError::InvalidEncryptOptions(
                "owner password must not be empty".into(),
            ));
        }
        if !self.algorithm.supports(self.key_length) {
            return Err(PdfError::InvalidEncryptOptions(format!(
                "{} does not support {}-bit keys",
                self.algorithm,
                self.key_length.bits()
            )));
        }
        Ok(())
    }
}
