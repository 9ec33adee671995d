use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;

use crate::error::Error;

/// The signing identity for one VU. FrostFS identities are NIST P-256
/// (secp256r1) keys; one key authenticates exactly one session.
pub type PrivateKey = SigningKey;

/// Turns optional caller-supplied key material into a usable private key.
///
/// An empty string produces a fresh random key. Anything else must be the
/// hex encoding of the canonical 32-byte scalar; a decode failure aborts
/// setup before any network activity.
pub fn resolve(hex_key: &str) -> Result<PrivateKey, Error> {
    if hex_key.is_empty() {
        return Ok(SigningKey::random(&mut OsRng));
    }

    let raw = hex::decode(hex_key).map_err(|e| Error::InvalidKey(Box::new(e)))?;
    SigningKey::from_slice(&raw).map_err(|e| Error::InvalidKey(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_KEY: &str = "1dd37fba80fec4e6a6f13fd708d8dcb3b29def768017052f6c930fa1c5d90bbb";

    #[test]
    fn generated_keys_are_unique() {
        let a = resolve("").unwrap();
        let b = resolve("").unwrap();
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn hex_key_round_trips() {
        let key = resolve(VALID_KEY).unwrap();
        assert_eq!(key.to_bytes().as_slice(), hex::decode(VALID_KEY).unwrap());
    }

    #[test]
    fn rejects_non_hex_input() {
        assert!(matches!(resolve("not a key"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(resolve("abcd"), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn rejects_zero_scalar() {
        let zeros = "00".repeat(32);
        assert!(matches!(resolve(&zeros), Err(Error::InvalidKey(_))));
    }
}
