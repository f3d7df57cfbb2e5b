//! Client identity derived from the client certificate
//!
//! The identity is the SHA-256 digest of the certificate DER, rendered as
//! base32 with a Luhn mod-32 check character after every 13 characters and
//! chunked into eight dash-separated groups of 7.

use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256};

const LUHN_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const LUHN_GROUP: usize = 13;
const CHUNK: usize = 7;

/// Deterministic client fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId([u8; 32]);

impl ClientId {
    /// Derive the identity from raw certificate bytes (DER)
    pub fn from_certificate(der: &[u8]) -> Self {
        Self(Sha256::digest(der).into())
    }

    /// Raw digest
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoded = BASE32_NOPAD.encode(&self.0);

        let mut checked = String::with_capacity(encoded.len() + encoded.len() / LUHN_GROUP);
        for group in encoded.as_bytes().chunks(LUHN_GROUP) {
            // base32 output is ASCII
            checked.extend(group.iter().map(|b| *b as char));
            checked.push(luhn_base32(group));
        }

        let chunks: Vec<&str> = checked
            .as_bytes()
            .chunks(CHUNK)
            .filter_map(|c| std::str::from_utf8(c).ok())
            .collect();
        write!(f, "{}", chunks.join("-"))
    }
}

/// Luhn mod N check character over the base32 alphabet
fn luhn_base32(group: &[u8]) -> char {
    let n = LUHN_ALPHABET.len();
    let mut factor = 1;
    let mut sum = 0;

    for b in group {
        let codepoint = LUHN_ALPHABET.iter().position(|a| a == b).unwrap_or(0);
        let addend = factor * codepoint;
        factor = if factor == 2 { 1 } else { 2 };
        sum += addend / n + addend % n;
    }

    let check = (n - sum % n) % n;
    LUHN_ALPHABET[check] as char
}
