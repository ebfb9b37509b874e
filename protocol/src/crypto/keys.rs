//! # Key Management
//!
//! Ed25519 keypair generation and serialization for FLUX signers.
//!
//! Every intent in FLUX is authorized by an Ed25519 signature, and every
//! signature traces back to one of these keypairs. This module is the
//! client side of the protocol — the relay itself only ever sees public
//! keys and signatures.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Fast verification — the relay checks one signature per request and
//!   should never be CPU-bound on it.
//!
//! ## Security considerations
//!
//! - We use OS-level RNG (`OsRng`) for key generation. If your OS RNG is
//!   broken, you have bigger problems than FLUX.
//! - Key bytes are never logged. If you add logging to this module,
//!   you will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* something failed — leaking details
/// about key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// A FLUX signing identity wrapping an Ed25519 keypair.
///
/// This is what a payer's wallet holds. The signing key is the crown
/// jewel — everything an attacker needs to drain goodwill out of a relay
/// is in these 32 bytes.
///
/// `FluxKeypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Serializing private keys should be a deliberate, conscious act, not
/// something that happens because someone shoved a keypair into a JSON
/// response. Use `secret_key_bytes()` / `from_seed()` explicitly.
///
/// # Examples
///
/// ```
/// use flux_protocol::crypto::FluxKeypair;
///
/// let kp = FluxKeypair::generate();
/// let msg = b"deposit 50.00 USDT for alice";
/// let sig = kp.sign(msg);
/// assert!(kp.public_key().verify(msg, &sig));
/// ```
pub struct FluxKeypair {
    signing_key: SigningKey,
}

/// The public half of a FLUX identity, safe to share with the world.
///
/// This travels inside every relay request so the verifier can check the
/// envelope without a key registry lookup.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluxPublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature over a canonical intent payload.
///
/// 64 bytes, deterministic for a given (key, message) pair. Stored as
/// `Vec<u8>` for serde compatibility, but always exactly 64 bytes for a
/// signature produced by [`FluxKeypair::sign`]. A malformed length simply
/// fails verification — no panics, just `false`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluxSignature {
    bytes: Vec<u8>,
}

impl FluxKeypair {
    /// Generates a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed. Useful for test
    /// fixtures and for loading keys recovered from a KDF.
    ///
    /// **Warning**: a weak seed makes a weak key. Use a proper CSPRNG or
    /// KDF to produce the seed bytes.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstructs a keypair from a hex-encoded secret key.
    ///
    /// Convenience for loading the key file written by `flux-relay keygen`.
    /// Please don't put raw hex keys in config files in production.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let mut arr = [0u8; SECRET_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_seed(&arr))
    }

    /// Returns the public key associated with this keypair.
    pub fn public_key(&self) -> FluxPublicKey {
        FluxPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw public key bytes (32 bytes). Safe to share, log, print.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Hex-encoded public key, the form carried in relay requests.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Signs a message and returns a [`FluxSignature`].
    ///
    /// Ed25519 signatures are deterministic — the same (key, message) pair
    /// always produces the same signature. No randomness needed at signing
    /// time, so a bad RNG can't leak the private key the way it can with
    /// ECDSA (see: PlayStation 3 master key incident, 2010).
    pub fn sign(&self, message: &[u8]) -> FluxSignature {
        let sig = self.signing_key.sign(message);
        FluxSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Exports the raw 32-byte secret key material.
    ///
    /// **Handle with extreme care.** Don't log it. Don't send it over the
    /// network in plaintext. Don't store it in a file called "my_keys.txt"
    /// on your desktop.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for FluxKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for FluxKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even
        // "partially" — a partial leak is still a leak.
        write!(f, "FluxKeypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// FluxPublicKey
// ---------------------------------------------------------------------------

impl FluxPublicKey {
    /// Creates a public key from raw bytes without point validation.
    ///
    /// Only use this for bytes that came out of [`FluxKeypair`]; anything
    /// off the wire should go through [`try_from_slice`](Self::try_from_slice).
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Tries to create a public key from a byte slice, validating that the
    /// bytes represent a valid Ed25519 point. Low-order and otherwise
    /// degenerate points are rejected here rather than at verify time.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != 32 {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        if key.is_weak() {
            return Err(KeyError::InvalidPublicKey);
        }
        Ok(Self { bytes })
    }

    /// Parses a hex-encoded public key string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::try_from_slice(&bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Verifies a signature against this public key.
    ///
    /// Returns `true` if the signature is valid, `false` otherwise. We use
    /// a boolean (rather than `Result`) because callers just want a yes/no
    /// answer — "invalid signature" and "wrong public key" are both "nope",
    /// and a detailed error oracle helps only attackers.
    pub fn verify(&self, message: &[u8], signature: &FluxSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        let dalek_sig = DalekSignature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &dalek_sig).is_ok()
    }
}

impl fmt::Display for FluxPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for FluxPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FluxPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// FluxSignature
// ---------------------------------------------------------------------------

impl FluxSignature {
    /// Creates a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw signature bytes (64 bytes for any signature we produced).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature string. 128 characters for a valid sig.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Base64-encoded signature string, the other wire encoding FLUX
    /// accepts. Mostly here for tests and client convenience.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

impl fmt::Display for FluxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for FluxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "FluxSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "FluxSignature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_valid_keypair() {
        let kp = FluxKeypair::generate();
        assert_eq!(kp.public_key_bytes().len(), 32);
        assert_eq!(kp.secret_key_bytes().len(), 32);
    }

    #[test]
    fn sign_verify_roundtrip() {
        let kp = FluxKeypair::generate();
        let msg = b"deposit 100.00 USDT";
        let sig = kp.sign(msg);
        assert!(kp.public_key().verify(msg, &sig));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let kp = FluxKeypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.public_key().verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = FluxKeypair::generate();
        let kp2 = FluxKeypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.public_key().verify(b"message", &sig));
    }

    #[test]
    fn deterministic_from_seed() {
        let seed = [42u8; 32];
        let kp1 = FluxKeypair::from_seed(&seed);
        let kp2 = FluxKeypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn secret_hex_roundtrip() {
        let kp = FluxKeypair::generate();
        let hex_str = hex::encode(kp.secret_key_bytes());
        let restored = FluxKeypair::from_hex(&hex_str).unwrap();
        assert_eq!(kp.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn invalid_secret_hex_rejected() {
        assert!(FluxKeypair::from_hex("deadbeef").is_err());
        assert!(FluxKeypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let kp = FluxKeypair::generate();
        let pk = kp.public_key();
        let recovered = FluxPublicKey::from_hex(&pk.to_hex()).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn public_key_rejects_wrong_length() {
        assert!(FluxPublicKey::try_from_slice(&[0u8; 16]).is_err());
    }

    #[test]
    fn two_generated_keypairs_differ() {
        // If this fails, your RNG is broken and you should panic (the
        // emotion, not the macro). Well, actually, both.
        let kp1 = FluxKeypair::generate();
        let kp2 = FluxKeypair::generate();
        assert_ne!(kp1.public_key_bytes(), kp2.public_key_bytes());
    }

    #[test]
    fn deterministic_signatures() {
        let kp = FluxKeypair::generate();
        let msg = b"determinism is underrated";
        assert_eq!(kp.sign(msg).as_bytes(), kp.sign(msg).as_bytes());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = FluxKeypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("FluxKeypair(pub="));
        assert!(!debug_str.contains("signing_key"));
    }

    #[test]
    fn empty_message_signing() {
        // Signing an empty message is valid in Ed25519. Some protocols
        // forbid it; we don't.
        let kp = FluxKeypair::generate();
        let sig = kp.sign(b"");
        assert!(kp.public_key().verify(b"", &sig));
    }

    #[test]
    fn signature_encodings_are_consistent() {
        let kp = FluxKeypair::generate();
        let sig = kp.sign(b"encode me");
        assert_eq!(sig.to_hex().len(), 128);
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(sig.to_base64())
            .unwrap();
        assert_eq!(decoded, sig.as_bytes());
    }
}
