//! Authenticated cookie values
//!
//! The session identifier never travels in the clear-and-unsigned. A cookie
//! value is produced as follows:
//!
//! 1. the identifier is optionally encrypted with AES-256-GCM (block key),
//!    the random nonce prepended to the ciphertext;
//! 2. the result is base64url encoded;
//! 3. an HMAC-SHA256 over `name|timestamp|value` is computed with the hash key;
//! 4. `timestamp|value|mac` is base64url encoded and becomes the cookie value.
//!
//! The cookie name is part of the MAC but not of the output, so a value minted
//! for one session name never verifies under another.
//!
//! Decoding checks the MAC before anything else, then the timestamp: a value
//! older than the freshness window is [`CookieError::Expired`] (a window of
//! zero disables the check), and one issued more than [`MAX_CLOCK_SKEW`]
//! seconds in the future is [`CookieError::TimestampTooNew`]. Only then is the
//! value decrypted.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::URL_SAFE, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default freshness window of a signed value, 30 days
pub const DEFAULT_COOKIE_MAX_AGE: i64 = 86400 * 30;

/// Browsers reject cookies much larger than this
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// How far in the future a timestamp may lie, in seconds, before a value is
/// rejected. Covers clock drift between the nodes sharing a key pair.
pub const MAX_CLOCK_SKEW: i64 = 60;

const NONCE_LEN: usize = 12;

/// Errors from encoding or decoding an authenticated cookie value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    #[error("hash key is not set")]
    HashKeyNotSet,
    #[error("block key must be 32 bytes, got {0}")]
    BlockKeyLength(usize),
    #[error("the value is too long")]
    ValueTooLong,
    #[error("the value is not valid: {0}")]
    Malformed(&'static str),
    #[error("the value is not valid: mac mismatch")]
    MacInvalid,
    #[error("expired timestamp")]
    Expired,
    #[error("timestamp is too new")]
    TimestampTooNew,
    #[error("the value could not be encrypted")]
    Encryption,
    #[error("the value could not be decrypted")]
    Decryption,
    #[error("no codecs were provided")]
    NoCodecs,
}

/// Authenticated encoding of small string values bound to a cookie name.
///
/// `decode` must fail closed: any value it cannot fully verify is an error.
pub trait Authenticator: Send + Sync + 'static {
    fn encode(&self, name: &str, value: &str) -> Result<String, CookieError>;
    fn decode(&self, name: &str, value: &str) -> Result<String, CookieError>;
}

/// A hash key used for signing plus an optional block key for encryption
#[derive(Clone)]
pub struct KeyPair {
    pub hash_key: Vec<u8>,
    pub block_key: Option<Vec<u8>>,
}

impl KeyPair {
    /// A signing-only key pair
    pub fn new(hash_key: impl Into<Vec<u8>>) -> Self {
        Self {
            hash_key: hash_key.into(),
            block_key: None,
        }
    }

    /// Also encrypt values with this 32-byte AES-256 key
    pub fn with_block_key(mut self, block_key: impl Into<Vec<u8>>) -> Self {
        self.block_key = Some(block_key.into());
        self
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("hash_key", &"<redacted>")
            .field("block_key", &self.block_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

enum Cipher {
    None,
    Aes(Box<Aes256Gcm>),
    // Reported on every use, so a misconfigured key never silently downgrades
    // to signing only.
    Invalid(usize),
}

/// One key pair's worth of cookie encoding
pub struct SecureCookie {
    hash_key: Vec<u8>,
    cipher: Cipher,
    max_age: i64,
    max_length: usize,
}

impl SecureCookie {
    pub fn new(pair: &KeyPair) -> Self {
        let cipher = match &pair.block_key {
            None => Cipher::None,
            Some(key) => match Aes256Gcm::new_from_slice(key) {
                Ok(cipher) => Cipher::Aes(Box::new(cipher)),
                Err(_) => Cipher::Invalid(key.len()),
            },
        };

        Self {
            hash_key: pair.hash_key.clone(),
            cipher,
            max_age: DEFAULT_COOKIE_MAX_AGE,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Set the freshness window in seconds. Zero, or a negative value,
    /// disables the age check.
    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.max_age = secs.max(0);
        self
    }

    /// Set the maximum encoded length. Zero disables the length check.
    pub fn with_max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    fn cipher(&self) -> Result<Option<&Aes256Gcm>, CookieError> {
        match &self.cipher {
            Cipher::None => Ok(None),
            Cipher::Aes(cipher) => Ok(Some(&**cipher)),
            Cipher::Invalid(len) => Err(CookieError::BlockKeyLength(*len)),
        }
    }

    fn mac(&self, name: &str, timestamp: &[u8], value: &[u8]) -> Result<HmacSha256, CookieError> {
        if self.hash_key.is_empty() {
            return Err(CookieError::HashKeyNotSet);
        }
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.hash_key)
            .map_err(|_| CookieError::HashKeyNotSet)?;
        mac.update(name.as_bytes());
        mac.update(b"|");
        mac.update(timestamp);
        mac.update(b"|");
        mac.update(value);
        Ok(mac)
    }

    fn encode_at(&self, name: &str, value: &str, timestamp: i64) -> Result<String, CookieError> {
        let payload = match self.cipher()? {
            Some(cipher) => encrypt(cipher, value.as_bytes())?,
            None => value.as_bytes().to_vec(),
        };
        let payload = URL_SAFE.encode(payload);
        let timestamp = timestamp.to_string();

        let tag = self
            .mac(name, timestamp.as_bytes(), payload.as_bytes())?
            .finalize()
            .into_bytes();

        let mut signed = Vec::with_capacity(timestamp.len() + payload.len() + tag.len() + 2);
        signed.extend_from_slice(timestamp.as_bytes());
        signed.push(b'|');
        signed.extend_from_slice(payload.as_bytes());
        signed.push(b'|');
        signed.extend_from_slice(&tag);

        let encoded = URL_SAFE.encode(signed);
        if self.max_length != 0 && encoded.len() > self.max_length {
            return Err(CookieError::ValueTooLong);
        }
        Ok(encoded)
    }
}

impl Authenticator for SecureCookie {
    fn encode(&self, name: &str, value: &str) -> Result<String, CookieError> {
        self.encode_at(name, value, Utc::now().timestamp())
    }

    fn decode(&self, name: &str, value: &str) -> Result<String, CookieError> {
        if self.max_length != 0 && value.len() > self.max_length {
            return Err(CookieError::ValueTooLong);
        }
        let cipher = self.cipher()?;

        let decoded = URL_SAFE
            .decode(value)
            .map_err(|_| CookieError::Malformed("base64 decode failed"))?;

        // The MAC is raw bytes and may itself contain '|'
        let mut parts = decoded.splitn(3, |&b| b == b'|');
        let (timestamp, payload, tag) = match (parts.next(), parts.next(), parts.next()) {
            (Some(t), Some(p), Some(m)) => (t, p, m),
            _ => return Err(CookieError::Malformed("wrong number of fields")),
        };

        self.mac(name, timestamp, payload)?
            .verify_slice(tag)
            .map_err(|_| CookieError::MacInvalid)?;

        let issued: i64 = std::str::from_utf8(timestamp)
            .ok()
            .and_then(|t| t.parse().ok())
            .ok_or(CookieError::Malformed("invalid timestamp"))?;
        let now = Utc::now().timestamp();
        if self.max_age != 0 && issued < now.saturating_sub(self.max_age) {
            return Err(CookieError::Expired);
        }
        if issued > now.saturating_add(MAX_CLOCK_SKEW) {
            return Err(CookieError::TimestampTooNew);
        }

        let payload = URL_SAFE
            .decode(payload)
            .map_err(|_| CookieError::Malformed("base64 decode failed"))?;
        let plain = match cipher {
            Some(cipher) => decrypt(cipher, &payload)?,
            None => payload,
        };

        String::from_utf8(plain).map_err(|_| CookieError::Malformed("value is not utf-8"))
    }
}

fn encrypt(cipher: &Aes256Gcm, plain: &[u8]) -> Result<Vec<u8>, CookieError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plain)
        .map_err(|_| CookieError::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

fn decrypt(cipher: &Aes256Gcm, sealed: &[u8]) -> Result<Vec<u8>, CookieError> {
    if sealed.len() < NONCE_LEN {
        return Err(CookieError::Decryption);
    }
    let (nonce, body) = sealed.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce), body)
        .map_err(|_| CookieError::Decryption)
}

/// Ordered codecs for key rotation.
///
/// Encoding uses the first codec that succeeds, which is normally the newest
/// key pair. Decoding tries every codec in order, so values signed with a
/// retired pair keep verifying for as long as that pair stays configured.
pub struct CodecChain {
    codecs: Vec<SecureCookie>,
}

impl CodecChain {
    pub fn from_pairs(pairs: &[KeyPair]) -> Self {
        Self {
            codecs: pairs.iter().map(SecureCookie::new).collect(),
        }
    }

    /// Apply one freshness window to every codec in the chain
    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.codecs = self
            .codecs
            .into_iter()
            .map(|codec| codec.with_max_age(secs))
            .collect();
        self
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    fn first_success<F>(&self, op: F) -> Result<String, CookieError>
    where
        F: Fn(&SecureCookie) -> Result<String, CookieError>,
    {
        let mut first_error = None;
        for codec in &self.codecs {
            match op(codec) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or(CookieError::NoCodecs))
    }
}

impl Authenticator for CodecChain {
    fn encode(&self, name: &str, value: &str) -> Result<String, CookieError> {
        self.first_success(|codec| codec.encode(name, value))
    }

    fn decode(&self, name: &str, value: &str) -> Result<String, CookieError> {
        self.first_success(|codec| codec.decode(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(hash_key: &str) -> SecureCookie {
        SecureCookie::new(&KeyPair::new(hash_key))
    }

    #[test]
    fn test_encode_and_decode() {
        let sc = codec("keyboard cat");
        let encoded = sc.encode("session", "test-session-id").unwrap();
        assert!(!encoded.contains("test-session-id"));
        assert_eq!(sc.decode("session", &encoded).unwrap(), "test-session-id");
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let encoded = codec("keyboard cat").encode("session", "id").unwrap();
        assert_eq!(
            codec("wrong secret").decode("session", &encoded),
            Err(CookieError::MacInvalid)
        );
    }

    #[test]
    fn test_name_is_bound_into_the_mac() {
        let sc = codec("keyboard cat");
        let encoded = sc.encode("session", "id").unwrap();
        assert_eq!(sc.decode("other", &encoded), Err(CookieError::MacInvalid));
    }

    #[test]
    fn test_single_bit_flip_is_rejected() {
        let sc = codec("keyboard cat");
        let encoded = sc.encode("session", "ABCDEFGH").unwrap();

        let mut raw = URL_SAFE.decode(&encoded).unwrap();
        let first_sep = raw.iter().position(|&b| b == b'|').unwrap();
        raw[first_sep + 1] ^= 0x01;
        let tampered = URL_SAFE.encode(raw);

        assert_eq!(sc.decode("session", &tampered), Err(CookieError::MacInvalid));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let sc = codec("keyboard cat");
        assert!(matches!(
            sc.decode("session", "not base64 at all!"),
            Err(CookieError::Malformed(_))
        ));
        let no_fields = URL_SAFE.encode(b"just-one-field");
        assert!(matches!(
            sc.decode("session", &no_fields),
            Err(CookieError::Malformed(_))
        ));
    }

    #[test]
    fn test_stale_timestamp_is_expired() {
        let sc = codec("keyboard cat").with_max_age(60);
        let old = Utc::now().timestamp() - 120;
        let encoded = sc.encode_at("session", "id", old).unwrap();
        assert_eq!(sc.decode("session", &encoded), Err(CookieError::Expired));

        let unchecked = codec("keyboard cat").with_max_age(0);
        assert_eq!(unchecked.decode("session", &encoded).unwrap(), "id");
    }

    #[test]
    fn test_slightly_future_timestamp_is_accepted() {
        let sc = codec("keyboard cat");
        let ahead = Utc::now().timestamp() + 2;
        let encoded = sc.encode_at("app", "ID", ahead).unwrap();
        assert_eq!(sc.decode("app", &encoded).unwrap(), "ID");

        let at_limit = Utc::now().timestamp() + MAX_CLOCK_SKEW - 5;
        let encoded = sc.encode_at("app", "ID", at_limit).unwrap();
        assert_eq!(sc.decode("app", &encoded).unwrap(), "ID");
    }

    #[test]
    fn test_negative_max_age_disables_age_check() {
        let old = Utc::now().timestamp() - 86400 * 365;
        for secs in [-1, i64::MIN] {
            let sc = codec("keyboard cat").with_max_age(secs);
            let encoded = sc.encode_at("session", "id", old).unwrap();
            assert_eq!(sc.decode("session", &encoded).unwrap(), "id");
        }
    }

    #[test]
    fn test_future_timestamp_is_rejected() {
        let sc = codec("keyboard cat");
        let far = Utc::now().timestamp() + MAX_CLOCK_SKEW + 120;
        let encoded = sc.encode_at("session", "id", far).unwrap();
        assert_eq!(
            sc.decode("session", &encoded),
            Err(CookieError::TimestampTooNew)
        );

        let future = Utc::now().timestamp() + 3600;
        let encoded = sc.encode_at("session", "id", future).unwrap();
        assert_eq!(
            sc.decode("session", &encoded),
            Err(CookieError::TimestampTooNew)
        );
    }

    #[test]
    fn test_block_key_encrypts() {
        let pair = KeyPair::new("hash-key").with_block_key([7u8; 32]);
        let sc = SecureCookie::new(&pair);
        let encoded = sc.encode("session", "secret-id").unwrap();

        // The inner value field is ciphertext, not the base64 of the plain id
        let raw = URL_SAFE.decode(&encoded).unwrap();
        let plain_b64 = URL_SAFE.encode("secret-id");
        assert!(!String::from_utf8_lossy(&raw).contains(&plain_b64));

        assert_eq!(sc.decode("session", &encoded).unwrap(), "secret-id");

        let signing_only = codec("hash-key");
        assert_ne!(
            signing_only.decode("session", &encoded).ok().as_deref(),
            Some("secret-id")
        );
    }

    #[test]
    fn test_bad_block_key_fails_encode() {
        let sc = SecureCookie::new(&KeyPair::new("hash-key").with_block_key(vec![1u8; 10]));
        assert_eq!(
            sc.encode("session", "id"),
            Err(CookieError::BlockKeyLength(10))
        );
    }

    #[test]
    fn test_empty_hash_key_fails_encode() {
        assert_eq!(
            codec("").encode("session", "id"),
            Err(CookieError::HashKeyNotSet)
        );
    }

    #[test]
    fn test_value_too_long() {
        let sc = codec("keyboard cat").with_max_length(64);
        assert_eq!(
            sc.encode("session", &"x".repeat(100)),
            Err(CookieError::ValueTooLong)
        );
    }

    #[test]
    fn test_key_rotation() {
        let old = KeyPair::new("old-secret");
        let new = KeyPair::new("new-secret");

        let signed_with_old = CodecChain::from_pairs(std::slice::from_ref(&old))
            .encode("session", "session-id")
            .unwrap();

        let rotated = CodecChain::from_pairs(&[new.clone(), old]);
        assert_eq!(rotated.len(), 2);
        assert_eq!(
            rotated.decode("session", &signed_with_old).unwrap(),
            "session-id"
        );

        // New values are signed with the newest pair
        let fresh = rotated.encode("session", "session-id").unwrap();
        let new_only = CodecChain::from_pairs(&[new]);
        assert_eq!(new_only.decode("session", &fresh).unwrap(), "session-id");
    }

    #[test]
    fn test_chain_skips_misconfigured_pair_for_encode() {
        let broken = KeyPair::new("a").with_block_key(vec![0u8; 3]);
        let chain = CodecChain::from_pairs(&[broken, KeyPair::new("b")]);
        let encoded = chain.encode("session", "id").unwrap();
        assert_eq!(chain.decode("session", &encoded).unwrap(), "id");
    }

    #[test]
    fn test_empty_chain() {
        let chain = CodecChain::from_pairs(&[]);
        assert!(chain.is_empty());
        assert_eq!(chain.encode("session", "id"), Err(CookieError::NoCodecs));
        assert_eq!(chain.decode("session", "anything"), Err(CookieError::NoCodecs));
    }

    #[test]
    fn test_key_pair_debug_redacts() {
        let pair = KeyPair::new("super-secret").with_block_key([1u8; 32]);
        let shown = format!("{:?}", pair);
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("redacted"));
    }
}
