//! Standard security handler and per-object string/stream encryption

mod handler;
pub mod rc4;

pub use handler::{CryptMethod, StandardSecurityHandler};

use crate::encryption::EncryptOptions;
use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId};

/// Authenticated security handler carried by a graph loaded from an
/// encrypted file, reused to re-encrypt it on write.
#[derive(Debug, Clone)]
pub struct SecurityState {
    handler: StandardSecurityHandler,
    key: Vec<u8>,
    encrypt_id: Option<ObjectId>,
}

impl SecurityState {
    pub fn new(handler: StandardSecurityHandler, key: Vec<u8>, encrypt_id: Option<ObjectId>) -> Self {
        Self {
            handler,
            key,
            encrypt_id,
        }
    }

    /// Authenticates `password` against an `/Encrypt` dictionary.
    /// Returns `Ok(None)` when the password is wrong.
    pub fn open(
        dict: &Dictionary,
        doc_id: &[u8],
        password: &[u8],
        encrypt_id: Option<ObjectId>,
    ) -> Result<Option<Self>> {
        let handler = StandardSecurityHandler::from_dictionary(dict, doc_id)?;
        Ok(handler
            .authenticate(password)
            .map(|key| Self::new(handler, key, encrypt_id)))
    }

    /// Fresh handler for `options`.
    pub fn create(options: &EncryptOptions, doc_id: &[u8]) -> Result<Self> {
        let (handler, key) = StandardSecurityHandler::create(options, doc_id)?;
        Ok(Self::new(handler, key, None))
    }

    pub fn handler(&self) -> &StandardSecurityHandler {
        &self.handler
    }

    pub fn encrypt_id(&self) -> Option<ObjectId> {
        self.encrypt_id
    }

    pub fn set_encrypt_id(&mut self, id: ObjectId) {
        self.encrypt_id = Some(id);
    }

    pub fn doc_id(&self) -> &[u8] {
        self.handler.doc_id()
    }

    pub fn decrypt_object(&self, id: ObjectId, object: &mut Object) {
        if Some(id) == self.encrypt_id {
            return;
        }
        self.walk(id, object, &mut |handler, key, data, stream| {
            Ok(handler.decrypt(key, id, data, stream))
        })
        .ok();
    }

    pub fn encrypt_object(&self, id: ObjectId, object: &mut Object) -> Result<()> {
        if Some(id) == self.encrypt_id {
            return Ok(());
        }
        self.walk(id, object, &mut |handler, key, data, stream| {
            handler.encrypt(key, id, data, stream)
        })
    }

    fn walk(
        &self,
        id: ObjectId,
        object: &mut Object,
        apply: &mut dyn FnMut(&StandardSecurityHandler, &[u8], &[u8], bool) -> Result<Vec<u8>>,
    ) -> Result<()> {
        match object {
            Object::String(s) => {
                let bytes = apply(&self.handler, &self.key, s.as_bytes(), false)?;
                s.set_bytes(bytes);
            }
            Object::Array(items) => {
                for item in items {
                    self.walk(id, item, apply)?;
                }
            }
            Object::Dictionary(dict) => {
                for value in dict.values_mut() {
                    self.walk(id, value, apply)?;
                }
            }
            Object::Stream(stream) => {
                let skip = {
                    let dict = stream.dictionary();
                    dict.has_type("XRef")
                        || (dict.has_type("Metadata") && !self.handler.encrypt_metadata())
                };
                for value in stream.dictionary_mut().values_mut() {
                    self.walk(id, value, apply)?;
                }
                if !skip {
                    let bytes = apply(&self.handler, &self.key, stream.raw_content(), true)?;
                    stream.replace_raw(bytes);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
