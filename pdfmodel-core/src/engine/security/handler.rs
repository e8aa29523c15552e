//! Standard security handler (ISO 32000-1 Section 7.6.3, ISO 32000-2 7.6.4)

use super::rc4::rc4;
use crate::encryption::{Algorithm, EncryptOptions};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId, PdfString};
use aes::cipher::block_padding::{NoPadding, Pkcs7};
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Password padding string (Algorithm 2, step a)
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    Identity,
    Rc4,
    AesV2,
    AesV3,
}

#[derive(Debug, Clone)]
pub struct StandardSecurityHandler {
    revision: i64,
    key_len: usize,
    o: Vec<u8>,
    u: Vec<u8>,
    oe: Vec<u8>,
    ue: Vec<u8>,
    perms: Vec<u8>,
    p: i32,
    encrypt_metadata: bool,
    string_method: CryptMethod,
    stream_method: CryptMethod,
    doc_id: Vec<u8>,
}

impl StandardSecurityHandler {
    /// Reads the handler parameters from an `/Encrypt` dictionary.
    pub fn from_dictionary(dict: &Dictionary, doc_id: &[u8]) -> Result<Self> {
        let filter = dict.get_name("Filter").unwrap_or("Standard");
        if filter != "Standard" {
            return Err(PdfError::Engine(format!(
                "unsupported security handler {filter}"
            )));
        }
        let version = dict.get_integer("V").unwrap_or(0);
        let revision = dict
            .get_integer("R")
            .ok_or_else(|| PdfError::Engine("encryption dictionary has no /R".into()))?;
        if !(2..=6).contains(&revision) {
            return Err(PdfError::Engine(format!(
                "unsupported security handler revision {revision}"
            )));
        }
        let key_len = match version {
            5 => 32,
            4 => 16,
            2 | 3 => (dict.get_integer("Length").unwrap_or(40) as usize / 8).clamp(5, 16),
            _ => 5,
        };
        let (string_method, stream_method) = if version >= 4 {
            (
                crypt_method(dict, dict.get_name("StrF").unwrap_or("Identity"))?,
                crypt_method(dict, dict.get_name("StmF").unwrap_or("Identity"))?,
            )
        } else {
            (CryptMethod::Rc4, CryptMethod::Rc4)
        };
        let bytes = |key: &str| {
            dict.get(key)
                .and_then(Object::as_pdf_string)
                .map(|s| s.as_bytes().to_vec())
                .unwrap_or_default()
        };
        let p = match dict.get("P") {
            Some(Object::Integer(p)) => *p as u32 as i32,
            _ => return Err(PdfError::Engine("encryption dictionary has no /P".into())),
        };
        Ok(Self {
            revision,
            key_len,
            o: bytes("O"),
            u: bytes("U"),
            oe: bytes("OE"),
            ue: bytes("UE"),
            perms: bytes("Perms"),
            p,
            encrypt_metadata: dict
                .get("EncryptMetadata")
                .and_then(Object::as_bool)
                .unwrap_or(true),
            string_method,
            stream_method,
            doc_id: doc_id.to_vec(),
        })
    }

    /// Builds a handler for fresh encryption and returns it with the file key.
    pub fn create(options: &EncryptOptions, doc_id: &[u8]) -> Result<(Self, Vec<u8>)> {
        options.validate()?;
        let algorithm = options.algorithm;
        let method = match algorithm {
            Algorithm::Rc4V1 | Algorithm::Rc4V2 => CryptMethod::Rc4,
            Algorithm::AesV2 => CryptMethod::AesV2,
            Algorithm::AesV3 => CryptMethod::AesV3,
        };
        let mut handler = Self {
            revision: algorithm.revision(),
            key_len: options.key_length.bytes(),
            o: Vec::new(),
            u: Vec::new(),
            oe: Vec::new(),
            ue: Vec::new(),
            perms: Vec::new(),
            p: options.permissions().to_p_value(),
            encrypt_metadata: true,
            string_method: method,
            stream_method: method,
            doc_id: doc_id.to_vec(),
        };
        let user = options.user_password.as_deref().unwrap_or("").as_bytes();
        let owner = options.owner_password.as_bytes();

        if handler.revision >= 5 {
            let key = handler.init_aes256(owner, user);
            return Ok((handler, key));
        }

        handler.o = handler.compute_o(owner, user);
        let key = handler.compute_key(user);
        handler.u = handler.compute_u(&key);
        Ok((handler, key))
    }

    /// Returns the file key for `password`, tried as owner and as user password.
    pub fn authenticate(&self, password: &[u8]) -> Option<Vec<u8>> {
        if self.revision >= 5 {
            return self.authenticate_aes256(password);
        }
        self.authenticate_user(password)
            .or_else(|| self.authenticate_owner(password))
    }

    pub fn encrypt_metadata(&self) -> bool {
        self.encrypt_metadata
    }

    pub fn doc_id(&self) -> &[u8] {
        &self.doc_id
    }

    /// The `/Encrypt` dictionary describing this handler.
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::name("Standard"));
        let version = match self.revision {
            2 => 1,
            3 => 2,
            4 => 4,
            _ => 5,
        };
        dict.set("V", version);
        dict.set("R", self.revision);
        dict.set("Length", self.key_len * 8);
        dict.set("O", PdfString::hexadecimal(self.o.clone()));
        dict.set("U", PdfString::hexadecimal(self.u.clone()));
        dict.set("P", self.p as i64);
        if version >= 4 {
            let cfm = match self.stream_method {
                CryptMethod::AesV3 => "AESV3",
                CryptMethod::AesV2 => "AESV2",
                CryptMethod::Rc4 => "V2",
                CryptMethod::Identity => "None",
            };
            let mut std_cf = Dictionary::new();
            std_cf.set("CFM", Object::name(cfm));
            std_cf.set("AuthEvent", Object::name("DocOpen"));
            std_cf.set("Length", self.key_len);
            let mut cf = Dictionary::new();
            cf.set("StdCF", std_cf);
            dict.set("CF", cf);
            dict.set("StmF", Object::name("StdCF"));
            dict.set("StrF", Object::name("StdCF"));
            dict.set("EncryptMetadata", self.encrypt_metadata);
        }
        if self.revision >= 5 {
            dict.set("OE", PdfString::hexadecimal(self.oe.clone()));
            dict.set("UE", PdfString::hexadecimal(self.ue.clone()));
            dict.set("Perms", PdfString::hexadecimal(self.perms.clone()));
        }
        dict
    }

    pub fn decrypt(&self, key: &[u8], id: ObjectId, data: &[u8], stream: bool) -> Vec<u8> {
        let method = self.method(stream);
        match method {
            CryptMethod::Identity => data.to_vec(),
            CryptMethod::Rc4 => rc4(&self.object_key(key, id, false), data),
            CryptMethod::AesV2 => aes_decrypt(&self.object_key(key, id, true), data),
            CryptMethod::AesV3 => aes_decrypt(key, data),
        }
    }

    pub fn encrypt(&self, key: &[u8], id: ObjectId, data: &[u8], stream: bool) -> Result<Vec<u8>> {
        let method = self.method(stream);
        match method {
            CryptMethod::Identity => Ok(data.to_vec()),
            CryptMethod::Rc4 => Ok(rc4(&self.object_key(key, id, false), data)),
            CryptMethod::AesV2 => aes_encrypt(&self.object_key(key, id, true), data),
            CryptMethod::AesV3 => aes_encrypt(key, data),
        }
    }

    fn method(&self, stream: bool) -> CryptMethod {
        if stream {
            self.stream_method
        } else {
            self.string_method
        }
    }

    /// Algorithm 1: per-object key.
    fn object_key(&self, key: &[u8], id: ObjectId, aes: bool) -> Vec<u8> {
        let mut data = key.to_vec();
        data.extend_from_slice(&id.number().to_le_bytes()[..3]);
        data.extend_from_slice(&id.generation().to_le_bytes());
        if aes {
            data.extend_from_slice(b"sAlT");
        }
        let digest = md5::compute(&data).0;
        digest[..(key.len() + 5).min(16)].to_vec()
    }

    /// Algorithm 2: file key from a user password.
    fn compute_key(&self, password: &[u8]) -> Vec<u8> {
        let mut data = pad_password(password).to_vec();
        data.extend_from_slice(&self.o);
        data.extend_from_slice(&self.p.to_le_bytes());
        data.extend_from_slice(&self.doc_id);
        if self.revision >= 4 && !self.encrypt_metadata {
            data.extend_from_slice(&[0xFF; 4]);
        }
        let mut hash = md5::compute(&data).0.to_vec();
        let n = self.rc4_key_len();
        if self.revision >= 3 {
            for _ in 0..50 {
                hash = md5::compute(&hash[..n]).0.to_vec();
            }
        }
        hash.truncate(n);
        hash
    }

    fn rc4_key_len(&self) -> usize {
        if self.revision == 2 {
            5
        } else {
            self.key_len
        }
    }

    /// RC4 key derived from the owner password (Algorithm 3, steps a-d).
    fn owner_key(&self, owner: &[u8]) -> Vec<u8> {
        let mut hash = md5::compute(pad_password(owner)).0.to_vec();
        if self.revision >= 3 {
            for _ in 0..50 {
                hash = md5::compute(&hash).0.to_vec();
            }
        }
        hash.truncate(self.rc4_key_len());
        hash
    }

    /// Algorithm 3: the `/O` value.
    fn compute_o(&self, owner: &[u8], user: &[u8]) -> Vec<u8> {
        let owner = if owner.is_empty() { user } else { owner };
        let key = self.owner_key(owner);
        let mut result = rc4(&key, &pad_password(user));
        if self.revision >= 3 {
            for i in 1..=19u8 {
                let round_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                result = rc4(&round_key, &result);
            }
        }
        result
    }

    /// Algorithms 4 and 5: the `/U` value for a file key.
    fn compute_u(&self, key: &[u8]) -> Vec<u8> {
        if self.revision == 2 {
            return rc4(key, &PADDING);
        }
        let mut data = PADDING.to_vec();
        data.extend_from_slice(&self.doc_id);
        let mut result = rc4(key, &md5::compute(&data).0);
        for i in 1..=19u8 {
            let round_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
            result = rc4(&round_key, &result);
        }
        let mut padded = result.clone();
        padded.extend_from_slice(&result);
        padded
    }

    /// Algorithm 6
    fn authenticate_user(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.compute_key(password);
        let u = self.compute_u(&key);
        let matches = if self.revision == 2 {
            u.get(..32) == self.u.get(..32)
        } else {
            self.u.len() >= 16 && u[..16] == self.u[..16]
        };
        matches.then_some(key)
    }

    /// Algorithm 7
    fn authenticate_owner(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.owner_key(password);
        let mut user = self.o.clone();
        if self.revision == 2 {
            user = rc4(&key, &user);
        } else {
            for i in (0..=19u8).rev() {
                let round_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                user = rc4(&round_key, &user);
            }
        }
        self.authenticate_user(&user)
    }

    fn init_aes256(&mut self, owner: &[u8], user: &[u8]) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let mut key = vec![0u8; 32];
        rng.fill_bytes(&mut key);
        let user = truncate_utf8_password(user);
        let owner = truncate_utf8_password(owner);

        let mut salts = [0u8; 16];
        rng.fill_bytes(&mut salts);
        let mut u = self.hash_2b(user, &salts[..8], &[]);
        u.extend_from_slice(&salts);
        let user_key = self.hash_2b(user, &salts[8..], &[]);
        self.ue = aes256_no_padding(&user_key, &key, true);
        self.u = u;

        rng.fill_bytes(&mut salts);
        let mut o = self.hash_2b(owner, &salts[..8], &self.u[..48]);
        o.extend_from_slice(&salts);
        let owner_key = self.hash_2b(owner, &salts[8..], &self.u[..48]);
        self.oe = aes256_no_padding(&owner_key, &key, true);
        self.o = o;

        let mut perms = [0u8; 16];
        perms[..4].copy_from_slice(&self.p.to_le_bytes());
        perms[4..8].copy_from_slice(&[0xFF; 4]);
        perms[8] = if self.encrypt_metadata { b'T' } else { b'F' };
        perms[9..12].copy_from_slice(b"adb");
        rng.fill_bytes(&mut perms[12..]);
        self.perms = aes256_no_padding(&key, &perms, true);
        key
    }

    fn authenticate_aes256(&self, password: &[u8]) -> Option<Vec<u8>> {
        if self.o.len() < 48 || self.u.len() < 48 {
            return None;
        }
        let password = truncate_utf8_password(password);
        let u48 = &self.u[..48];
        if self.hash_2b(password, &self.o[32..40], u48) == self.o[..32] {
            let intermediate = self.hash_2b(password, &self.o[40..48], u48);
            return Some(aes256_no_padding(&intermediate, &self.oe, false));
        }
        if self.hash_2b(password, &self.u[32..40], &[]) == self.u[..32] {
            let intermediate = self.hash_2b(password, &self.u[40..48], &[]);
            return Some(aes256_no_padding(&intermediate, &self.ue, false));
        }
        None
    }

    /// Algorithm 2.B (revision 6); plain SHA-256 for revision 5.
    fn hash_2b(&self, password: &[u8], salt: &[u8], vector: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        hasher.update(vector);
        let mut k = hasher.finalize().to_vec();
        if self.revision == 5 {
            return k;
        }

        let mut round = 0u32;
        loop {
            let mut block = Vec::with_capacity(password.len() + k.len() + vector.len());
            block.extend_from_slice(password);
            block.extend_from_slice(&k);
            block.extend_from_slice(vector);
            let k1 = block.repeat(64);

            let e = match Aes128CbcEnc::new_from_slices(&k[..16], &k[16..32]) {
                Ok(cipher) => {
                    let mut buf = k1.clone();
                    let len = buf.len();
                    match cipher.encrypt_padded_mut::<NoPadding>(&mut buf, len) {
                        Ok(out) => out.to_vec(),
                        Err(_) => return k[..32].to_vec(),
                    }
                }
                Err(_) => return k[..32].to_vec(),
            };

            let selector = e[..16].iter().map(|&b| b as u32).sum::<u32>() % 3;
            k = match selector {
                0 => Sha256::digest(&e).to_vec(),
                1 => Sha384::digest(&e).to_vec(),
                _ => Sha512::digest(&e).to_vec(),
            };
            round += 1;
            let last = e.last().copied().unwrap_or(0) as u32;
            if round >= 64 && last <= round - 32 {
                break;
            }
        }
        k.truncate(32);
        k
    }
}

fn crypt_method(dict: &Dictionary, filter_name: &str) -> Result<CryptMethod> {
    if filter_name == "Identity" {
        return Ok(CryptMethod::Identity);
    }
    let cfm = dict
        .get_dict("CF")
        .and_then(|cf| cf.get_dict(filter_name))
        .and_then(|f| f.get_name("CFM"))
        .unwrap_or("None");
    match cfm {
        "None" => Ok(CryptMethod::Identity),
        "V2" => Ok(CryptMethod::Rc4),
        "AESV2" => Ok(CryptMethod::AesV2),
        "AESV3" => Ok(CryptMethod::AesV3),
        other => Err(PdfError::Engine(format!("unsupported crypt filter method {other}"))),
    }
}

pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

fn truncate_utf8_password(password: &[u8]) -> &[u8] {
    &password[..password.len().min(127)]
}

/// AES-256-CBC with a zero IV and no padding, used for `/UE`, `/OE` and `/Perms`.
fn aes256_no_padding(key: &[u8], data: &[u8], encrypt: bool) -> Vec<u8> {
    let iv = [0u8; 16];
    let mut buf = data.to_vec();
    let len = buf.len() - buf.len() % 16;
    buf.truncate(len);
    let out = if encrypt {
        Aes256CbcEnc::new_from_slices(key, &iv)
            .ok()
            .and_then(|c| c.encrypt_padded_mut::<NoPadding>(&mut buf, len).ok().map(<[u8]>::to_vec))
    } else {
        Aes256CbcDec::new_from_slices(key, &iv)
            .ok()
            .and_then(|c| c.decrypt_padded_mut::<NoPadding>(&mut buf).ok().map(<[u8]>::to_vec))
    };
    out.unwrap_or_default()
}

/// AES-CBC with a random IV prepended and PKCS#7 padding.
fn aes_encrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut iv);
    let mut buf = data.to_vec();
    buf.resize(data.len() + 16, 0);
    let cipher_text = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, &iv)
            .map_err(|e| PdfError::Engine(e.to_string()))?
            .encrypt_padded_mut::<Pkcs7>(&mut buf, data.len())
            .map_err(|_| PdfError::Engine("AES padding failed".into()))?
            .to_vec(),
        32 => Aes256CbcEnc::new_from_slices(key, &iv)
            .map_err(|e| PdfError::Engine(e.to_string()))?
            .encrypt_padded_mut::<Pkcs7>(&mut buf, data.len())
            .map_err(|_| PdfError::Engine("AES padding failed".into()))?
            .to_vec(),
        other => return Err(PdfError::Engine(format!("invalid AES key length {other}"))),
    };
    let mut out = iv.to_vec();
    out.extend_from_slice(&cipher_text);
    Ok(out)
}

/// Reverses [`aes_encrypt`]. Malformed input is returned unchanged.
fn aes_decrypt(key: &[u8], data: &[u8]) -> Vec<u8> {
    if data.len() < 32 || data.len() % 16 != 0 {
        if data.len() == 16 {
            return Vec::new();
        }
        return data.to_vec();
    }
    let (iv, body) = data.split_at(16);
    let mut buf = body.to_vec();
    let plain = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .ok()
            .and_then(|c| c.decrypt_padded_mut::<NoPadding>(&mut buf).ok().map(<[u8]>::to_vec)),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .ok()
            .and_then(|c| c.decrypt_padded_mut::<NoPadding>(&mut buf).ok().map(<[u8]>::to_vec)),
        _ => None,
    };
    match plain {
        Some(plain) => unpad(plain),
        None => data.to_vec(),
    }
}

/// Strips PKCS#7 padding, leaving the data alone when the padding is invalid.
fn unpad(mut data: Vec<u8>) -> Vec<u8> {
    let Some(&pad) = data.last() else {
        return data;
    };
    let pad_len = pad as usize;
    if pad_len == 0 || pad_len > 16 || pad_len > data.len() {
        return data;
    }
    if data[data.len() - pad_len..].iter().all(|&b| b == pad) {
        data.truncate(data.len() - pad_len);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::{KeyLength, Permission};

    fn options(algorithm: Algorithm, key_length: KeyLength) -> EncryptOptions {
        EncryptOptions::new("owner-secret")
            .user_password("user-secret")
            .algorithm(algorithm)
            .key_length(key_length)
            .allow(Permission::Print)
    }

    fn reload(handler: &StandardSecurityHandler) -> StandardSecurityHandler {
        StandardSecurityHandler::from_dictionary(&handler.to_dictionary(), handler.doc_id())
            .unwrap()
    }

    #[test]
    fn test_pad_password() {
        assert_eq!(pad_password(b""), PADDING);
        let padded = pad_password(b"abc");
        assert_eq!(&padded[..3], b"abc");
        assert_eq!(&padded[3..], &PADDING[..29]);
    }

    #[test]
    fn test_rc4_40_user_and_owner_authenticate() {
        let (handler, key) =
            StandardSecurityHandler::create(&options(Algorithm::Rc4V1, KeyLength::Bits40), b"docid")
                .unwrap();
        assert_eq!(key.len(), 5);
        let parsed = reload(&handler);
        assert_eq!(parsed.authenticate(b"user-secret"), Some(key.clone()));
        assert_eq!(parsed.authenticate(b"owner-secret"), Some(key));
        assert_eq!(parsed.authenticate(b"wrong"), None);
        assert_eq!(parsed.authenticate(b""), None);
    }

    #[test]
    fn test_rc4_128_round_trip() {
        let (handler, key) = StandardSecurityHandler::create(
            &options(Algorithm::Rc4V2, KeyLength::Bits128),
            b"0123456789abcdef",
        )
        .unwrap();
        let id = ObjectId::new(7, 0);
        let secret = handler.encrypt(&key, id, b"page content", true).unwrap();
        assert_ne!(secret, b"page content");
        let parsed = reload(&handler);
        let key = parsed.authenticate(b"user-secret").unwrap();
        assert_eq!(parsed.decrypt(&key, id, &secret, true), b"page content");
    }

    #[test]
    fn test_empty_user_password_opens_without_credentials() {
        let options = EncryptOptions::new("owner")
            .algorithm(Algorithm::Rc4V2)
            .key_length(KeyLength::Bits128);
        let (handler, key) = StandardSecurityHandler::create(&options, b"id").unwrap();
        assert_eq!(reload(&handler).authenticate(b""), Some(key));
    }

    #[test]
    fn test_aes128_round_trip() {
        let (handler, key) =
            StandardSecurityHandler::create(&options(Algorithm::AesV2, KeyLength::Bits128), b"id")
                .unwrap();
        let id = ObjectId::new(3, 0);
        let secret = handler.encrypt(&key, id, b"(Hello)", false).unwrap();
        assert_eq!(secret.len(), 32);
        let parsed = reload(&handler);
        let key = parsed.authenticate(b"owner-secret").unwrap();
        assert_eq!(parsed.decrypt(&key, id, &secret, false), b"(Hello)");
    }

    #[test]
    fn test_aes256_round_trip() {
        let (handler, key) =
            StandardSecurityHandler::create(&options(Algorithm::AesV3, KeyLength::Bits256), b"id")
                .unwrap();
        assert_eq!(key.len(), 32);
        let parsed = reload(&handler);
        assert_eq!(parsed.authenticate(b"user-secret"), Some(key.clone()));
        assert_eq!(parsed.authenticate(b"owner-secret"), Some(key.clone()));
        assert_eq!(parsed.authenticate(b"nope"), None);

        let id = ObjectId::new(1, 0);
        let secret = handler.encrypt(&key, id, b"stream body", true).unwrap();
        assert_eq!(parsed.decrypt(&key, id, &secret, true), b"stream body");
    }

    #[test]
    fn test_dictionary_shape() {
        let (handler, _) =
            StandardSecurityHandler::create(&options(Algorithm::AesV2, KeyLength::Bits128), b"id")
                .unwrap();
        let dict = handler.to_dictionary();
        assert_eq!(dict.get_integer("V"), Some(4));
        assert_eq!(dict.get_integer("R"), Some(4));
        assert_eq!(dict.get_name("StmF"), Some("StdCF"));
        assert_eq!(
            dict.get_dict("CF")
                .and_then(|cf| cf.get_dict("StdCF"))
                .and_then(|f| f.get_name("CFM")),
            Some("AESV2")
        );
    }

    #[test]
    fn test_unsupported_filter() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::name("Adobe.PubSec"));
        dict.set("R", 4);
        assert!(StandardSecurityHandler::from_dictionary(&dict, b"").is_err());
    }

    #[test]
    fn test_unpad() {
        assert_eq!(unpad(vec![1, 2, 3, 2, 2]), vec![1, 2, 3]);
        assert_eq!(unpad(vec![1, 2, 3, 0]), vec![1, 2, 3, 0]);
        assert_eq!(unpad(Vec::new()), Vec::<u8>::new());
    }
}
