//! Public keys that remember their serialized form
//!
//! secp256k1 keys carry no compression flag, but scripts commit to the exact
//! bytes a key was written with. A 65-byte key hashes and sorts differently
//! from the 33-byte form of the same point.

use crate::error::{AuthError, Result};
use crate::hash::hash160;
use crate::types::ByteString;
use secp256k1::{Secp256k1, SecretKey, Signing};
use std::fmt;

/// An ECDSA public key and the encoding it is written with
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    /// Whether the key serializes to 33 bytes
    pub compressed: bool,
    pub inner: secp256k1::PublicKey,
}

impl PublicKey {
    /// Compressed key from a bare secp256k1 key
    pub fn new(inner: secp256k1::PublicKey) -> Self {
        PublicKey { compressed: true, inner }
    }

    /// Uncompressed (65-byte) key from a bare secp256k1 key
    pub fn new_uncompressed(inner: secp256k1::PublicKey) -> Self {
        PublicKey { compressed: false, inner }
    }

    /// Compressed public key of `secret_key`
    pub fn from_secret_key<C: Signing>(secp: &Secp256k1<C>, secret_key: &SecretKey) -> Self {
        PublicKey::new(secp256k1::PublicKey::from_secret_key(secp, secret_key))
    }

    /// Parse a 33-byte compressed or 65-byte `04`-prefixed key
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let compressed = match data.len() {
            33 => true,
            65 if data[0] == 0x04 => false,
            _ => return Err(AuthError::Crypto(secp256k1::Error::InvalidPublicKey)),
        };
        Ok(PublicKey { compressed, inner: secp256k1::PublicKey::from_slice(data)? })
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| AuthError::Serialization(format!("invalid public key hex: {}", e)))?;
        PublicKey::from_slice(&bytes)
    }

    pub fn to_bytes(&self) -> ByteString {
        if self.compressed {
            self.inner.serialize().to_vec()
        } else {
            self.inner.serialize_uncompressed().to_vec()
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// hash160 of the serialized key, as committed to by P2PKH outputs
    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.to_bytes())
    }
}

impl From<secp256k1::PublicKey> for PublicKey {
    fn from(inner: secp256k1::PublicKey) -> Self {
        PublicKey::new(inner)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_UNCOMPRESSED: &str = "0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

    #[test]
    fn test_encoding_is_kept() {
        let compressed = PublicKey::from_hex(G_COMPRESSED).unwrap();
        let uncompressed = PublicKey::from_hex(G_UNCOMPRESSED).unwrap();
        assert!(compressed.compressed);
        assert!(!uncompressed.compressed);
        assert_eq!(compressed.inner, uncompressed.inner);
        assert_ne!(compressed, uncompressed);
        assert_eq!(compressed.to_hex(), G_COMPRESSED);
        assert_eq!(uncompressed.to_hex(), G_UNCOMPRESSED);
        assert_eq!(hex::encode(compressed.pubkey_hash()), "751e76e8199196d454941c45d1b3a323f1433bd6");
        assert_eq!(hex::encode(uncompressed.pubkey_hash()), "91b24bf9f5288532960ac687abb035127b1d28a5");
    }

    #[test]
    fn test_from_secret_key_is_compressed() {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let secret_key = SecretKey::from_slice(&bytes).unwrap();
        let key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret_key);
        assert_eq!(key.to_hex(), G_COMPRESSED);
    }

    #[test]
    fn test_rejects_hybrid_and_short_keys() {
        let hybrid = format!("06{}", &G_UNCOMPRESSED[2..]);
        assert!(matches!(PublicKey::from_hex(&hybrid), Err(AuthError::Crypto(_))));
        assert!(matches!(PublicKey::from_hex("02"), Err(AuthError::Crypto(_))));
        assert!(matches!(PublicKey::from_hex("zz"), Err(AuthError::Serialization(_))));
    }
}
