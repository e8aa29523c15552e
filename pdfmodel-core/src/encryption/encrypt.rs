use super::options::{Algorithm, EncryptOptions};
use super::permissions::{Permission, Permissions};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};

/// Parameters recovered from an existing encryption dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptInfo {
    pub filter: String,
    pub version: i64,
    pub revision: i64,
    pub key_length_bits: u32,
    pub p_value: i32,
    pub encrypt_metadata: bool,
    pub algorithm: Option<Algorithm>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Options(EncryptOptions),
    Derived(EncryptInfo),
}

/// Permission set plus cipher configuration of a document.
///
/// An `Encrypt` is either built fresh from [`EncryptOptions`], ready to be
/// assigned to a document before writing, or derived from a loaded
/// document's trailer for inspection. Only the first kind can encrypt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypt {
    source: Source,
    permissions: Permissions,
}

impl Encrypt {
    pub fn new(options: EncryptOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            permissions: options.permissions(),
            source: Source::Options(options),
        })
    }

    /// Reads an `/Encrypt` dictionary.
    pub fn from_dictionary(dict: &Dictionary) -> Result<Self> {
        let p_value = match dict.get("P") {
            Some(Object::Integer(p)) => *p as u32 as i32,
            _ => {
                return Err(PdfError::InvalidStructure(
                    "encryption dictionary has no /P entry".into(),
                ))
            }
        };
        let version = dict.get_integer("V").unwrap_or(0);
        let revision = dict.get_integer("R").unwrap_or(2);
        let key_length_bits = match (version, dict.get_integer("Length")) {
            (5, _) => 256,
            (_, Some(bits)) if bits > 0 => bits as u32,
            (4, None) => 128,
            _ => 40,
        };
        let info = EncryptInfo {
            filter: dict.get_name("Filter").unwrap_or("Standard").to_string(),
            version,
            revision,
            key_length_bits,
            p_value,
            encrypt_metadata: dict
                .get("EncryptMetadata")
                .and_then(Object::as_bool)
                .unwrap_or(true),
            algorithm: detect_algorithm(dict, revision),
        };
        Ok(Self {
            permissions: Permissions::from_p_value(p_value),
            source: Source::Derived(info),
        })
    }

    /// Pure membership test against the permission set.
    pub fn is_allowed(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        match &self.source {
            Source::Options(options) => Some(options.algorithm),
            Source::Derived(info) => info.algorithm,
        }
    }

    pub fn key_length(&self) -> u32 {
        match &self.source {
            Source::Options(options) => options.key_length.bits(),
            Source::Derived(info) => info.key_length_bits,
        }
    }

    /// The construction options; `None` for a derived instance.
    pub fn options(&self) -> Option<&EncryptOptions> {
        match &self.source {
            Source::Options(options) => Some(options),
            Source::Derived(_) => None,
        }
    }

    pub fn info(&self) -> Option<&EncryptInfo> {
        match &self.source {
            Source::Options(_) => None,
            Source::Derived(info) => Some(info),
        }
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.source, Source::Derived(_))
    }

    /// Options to encrypt with, or a contract error for derived instances.
    pub fn require_options(&self) -> Result<&EncryptOptions> {
        self.options().ok_or(PdfError::MissingEncryptOptions)
    }
}

fn detect_algorithm(dict: &Dictionary, revision: i64) -> Option<Algorithm> {
    match revision {
        2 => Some(Algorithm::Rc4V1),
        3 => Some(Algorithm::Rc4V2),
        4 => {
            let method = dict
                .get_dict("CF")
                .and_then(|cf| cf.get_dict("StdCF"))
                .and_then(|std_cf| std_cf.get_name("CFM"));
            match method {
                Some("AESV2") => Some(Algorithm::AesV2),
                _ => Some(Algorithm::Rc4V2),
            }
        }
        5 | 6 => Some(Algorithm::AesV3),
        _ => None,
    }
}
