//! Solana keypair generation.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

use super::{Candidate, KeypairSource, SourceError};

/// The base58 alphabet used by Solana addresses.
pub(crate) const BASE58_ALPHABET: &str =
    "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Generates ed25519 keypairs with base58 encodings.
///
/// The public encoding is the base58 of the 32-byte verifying key. The
/// private encoding is the base58 of the 64-byte `secret || public` pair,
/// which is the form Solana wallets import.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolanaSource;

impl SolanaSource {
    pub fn new() -> Self {
        Self
    }

    /// Encodes an existing signing key.
    pub fn encode(signing_key: &SigningKey) -> Candidate {
        let public_key = bs58::encode(signing_key.verifying_key().as_bytes()).into_string();
        let private_key = bs58::encode(signing_key.to_keypair_bytes()).into_string();
        Candidate {
            public_key,
            private_key,
        }
    }
}

impl KeypairSource for SolanaSource {
    #[inline]
    fn generate(&self) -> Result<Candidate, SourceError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        Ok(Self::encode(&signing_key))
    }

    fn alphabet(&self) -> &'static str {
        BASE58_ALPHABET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_address_is_base58() {
        let candidate = SolanaSource::new().generate().unwrap();
        assert!((32..=44).contains(&candidate.public_key.len()));
        assert!(candidate
            .public_key
            .chars()
            .all(|c| BASE58_ALPHABET.contains(c)));
    }

    #[test]
    fn test_private_key_embeds_public_key() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let candidate = SolanaSource::encode(&signing_key);

        let keypair_bytes = bs58::decode(&candidate.private_key).into_vec().unwrap();
        assert_eq!(keypair_bytes.len(), 64);

        let public_bytes = bs58::decode(&candidate.public_key).into_vec().unwrap();
        assert_eq!(&keypair_bytes[32..], public_bytes.as_slice());
        assert_eq!(&keypair_bytes[..32], &[7u8; 32]);
    }

    #[test]
    fn test_draws_are_independent() {
        let source = SolanaSource::new();
        let a = source.generate().unwrap();
        let b = source.generate().unwrap();
        assert_ne!(a.public_key, b.public_key);
    }
}
