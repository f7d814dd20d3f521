//! `Sec-WebSocket-Key` generation and `Sec-WebSocket-Accept` computation.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

use crate::error::{Error, Result};

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation (RFC 6455).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Number of random bytes in a handshake nonce.
pub const NONCE_LEN: usize = 16;

/// Source of the random bytes behind each nonce.
///
/// Production code uses [`OsRandom`]; tests can substitute a deterministic
/// implementation.
pub trait RandomSource {
    /// Fill `buf` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RandomUnavailable`] if the source cannot deliver.
    fn fill(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).fill(buf)
    }
}

/// The operating system's cryptographically secure generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        getrandom::getrandom(buf).map_err(|e| Error::RandomUnavailable(e.to_string()))
    }
}

/// A Base64-encoded 16-byte handshake nonce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonceKey(String);

impl NonceKey {
    /// Generate a fresh nonce from `random`.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::RandomUnavailable`]; there is no fallback source.
    pub fn generate<R: RandomSource + ?Sized>(random: &mut R) -> Result<Self> {
        let mut bytes = [0u8; NONCE_LEN];
        random.fill(&mut bytes)?;
        Ok(Self(BASE64.encode(bytes)))
    }

    /// The encoded key as sent in `Sec-WebSocket-Key`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The accept value a compliant server must echo for this key.
    #[must_use]
    pub fn expected_accept(&self) -> String {
        compute_accept_key(&self.0)
    }
}

impl std::fmt::Display for NonceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use wsdial::protocol::nonce::compute_accept_key;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// let accept = compute_accept_key(key);
/// assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    let hash = hasher.finalize();
    BASE64.encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Counting(u8);

    impl RandomSource for Counting {
        fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
            for b in buf.iter_mut() {
                *b = self.0;
                self.0 = self.0.wrapping_add(1);
            }
            Ok(())
        }
    }

    struct Broken;

    impl RandomSource for Broken {
        fn fill(&mut self, _buf: &mut [u8]) -> Result<()> {
            Err(Error::RandomUnavailable("entropy pool closed".into()))
        }
    }

    // RFC 6455 Section 1.3 example
    #[test]
    fn test_compute_accept_key_rfc_example() {
        let key = "dGhlIHNhbXBsZSBub25jZQ==";
        let expected = "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=";
        assert_eq!(compute_accept_key(key), expected);
    }

    #[test]
    fn test_deterministic_source() {
        let nonce = NonceKey::generate(&mut Counting(0)).unwrap();
        assert_eq!(nonce.as_str(), "AAECAwQFBgcICQoLDA0ODw==");
        assert_eq!(nonce.expected_accept(), "Bz3qJYTGdOe8gUSpLosEdiLKDrk=");
    }

    #[test]
    fn test_nonce_shape() {
        let nonce = NonceKey::generate(&mut OsRandom).unwrap();
        assert_eq!(nonce.as_str().len(), 24);
        let decoded = BASE64.decode(nonce.as_str()).unwrap();
        assert_eq!(decoded.len(), NONCE_LEN);
    }

    #[test]
    fn test_nonce_freshness() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let nonce = NonceKey::generate(&mut OsRandom).unwrap();
            assert!(seen.insert(nonce), "duplicate nonce generated");
        }
    }

    #[test]
    fn test_random_failure_is_fatal() {
        let result = NonceKey::generate(&mut Broken);
        assert!(matches!(result, Err(Error::RandomUnavailable(_))));
    }

    #[test]
    fn test_source_through_mut_ref() {
        let mut source = Counting(16);
        let mut by_ref = &mut source;
        let first = NonceKey::generate(&mut by_ref).unwrap();
        let second = NonceKey::generate(&mut by_ref).unwrap();
        assert_ne!(first, second);
    }
}
