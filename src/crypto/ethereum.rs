//! Ethereum keypair generation.

use std::fmt;

use secp256k1::{PublicKey, Secp256k1, SecretKey, SignOnly};
use tiny_keccak::{Hasher, Keccak};

use super::{Candidate, KeypairSource, SourceError};

const HEX_ALPHABET: &str = "0123456789abcdef";

/// An Ethereum address (20 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Derives an address from a secp256k1 public key.
    ///
    /// Process:
    /// 1. Serialize the public key in uncompressed form (65 bytes)
    /// 2. Hash the last 64 bytes with Keccak-256
    /// 3. Take the last 20 bytes of the hash
    #[inline]
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let public_key_bytes = public_key.serialize_uncompressed();

        let mut hasher = Keccak::v256();
        hasher.update(&public_key_bytes[1..]);

        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);
        Self(address_bytes)
    }

    /// Returns the address as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Generates secp256k1 keypairs with hex encodings.
///
/// The public encoding is the bare 40-char hex address so that prefixes
/// are matched from the first address nibble, not from `0x`.
pub struct EthereumSource {
    secp: Secp256k1<SignOnly>,
}

impl EthereumSource {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }

    /// Encodes a keypair from an existing secret key.
    pub fn encode(&self, secret_bytes: [u8; 32]) -> Result<Candidate, SourceError> {
        let secret_key = SecretKey::from_slice(&secret_bytes)
            .map_err(|e| SourceError::Derivation(e.to_string()))?;
        let public_key = PublicKey::from_secret_key(&self.secp, &secret_key);
        Ok(Candidate {
            public_key: Address::from_public_key(&public_key).to_hex(),
            private_key: hex::encode(secret_bytes),
        })
    }
}

impl Default for EthereumSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EthereumSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EthereumSource")
    }
}

impl KeypairSource for EthereumSource {
    #[inline]
    fn generate(&self) -> Result<Candidate, SourceError> {
        let (secret_key, public_key) = self.secp.generate_keypair(&mut rand::thread_rng());
        Ok(Candidate {
            public_key: Address::from_public_key(&public_key).to_hex(),
            private_key: hex::encode(secret_key.secret_bytes()),
        })
    }

    fn alphabet(&self) -> &'static str {
        HEX_ALPHABET
    }

    fn case_significant(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let candidate = EthereumSource::new().generate().unwrap();
        assert_eq!(candidate.public_key.len(), 40);
        assert_eq!(candidate.private_key.len(), 64);
        assert!(candidate.public_key.chars().all(|c| HEX_ALPHABET.contains(c)));
    }

    #[test]
    fn test_deterministic_address() {
        let mut secret_bytes = [0u8; 32];
        secret_bytes[31] = 1;
        let candidate = EthereumSource::new().encode(secret_bytes).unwrap();

        // Address for private key = 1 is well-known
        assert_eq!(
            candidate.public_key,
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_zero_secret_rejected() {
        let result = EthereumSource::new().encode([0u8; 32]);
        assert!(matches!(result, Err(SourceError::Derivation(_))));
    }
}
