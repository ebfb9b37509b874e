//! # Signature Verification
//!
//! The relay-side signature gate. Given the canonical payload bytes, a
//! signature in whatever encoding the client chose, and a hex-encoded
//! public key, answer one question: did the holder of this key sign these
//! exact bytes?
//!
//! ## Error posture
//!
//! A signature that decodes fine but doesn't verify is a *normal* `false`
//! result, not a fault — forged and stale envelopes are expected traffic
//! for a relay. Only inputs we cannot even interpret (bad hex, wrong
//! lengths, unknown encodings, invalid curve points) are errors. Callers
//! must treat both the same way for authorization purposes: deny.
//!
//! ## Accepted signature encodings
//!
//! | Encoding    | Shape                                   |
//! |-------------|-----------------------------------------|
//! | 0x-hex      | `0x` + 128 hex chars                    |
//! | bare hex    | 128 hex chars                           |
//! | base64      | standard alphabet, decodes to 64 bytes  |
//!
//! Raw 64-byte signatures are handled by [`verify_raw`] for callers that
//! already hold bytes rather than wire strings.

use base64::Engine;
use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use thiserror::Error;

use crate::config::{SIGNATURE_LENGTH, VERIFYING_KEY_LENGTH};

/// Errors for inputs the verifier cannot interpret.
///
/// Note what is *not* here: "signature did not verify". That outcome is
/// `Ok(false)`, by design.
#[derive(Debug, Error)]
pub enum MalformedInputError {
    /// The public key is not valid hex, the wrong length, or not a valid
    /// Ed25519 point.
    #[error("malformed public key")]
    PublicKey,

    /// The signature string is not hex, not base64, or decodes to the
    /// wrong number of bytes.
    #[error("malformed signature: {reason}")]
    Signature { reason: String },
}

/// Decodes a wire-format signature string into 64 raw bytes.
///
/// Tries, in order: `0x`-prefixed hex, bare hex, base64. The first
/// encoding that both decodes and yields exactly [`SIGNATURE_LENGTH`]
/// bytes wins. Anything else is rejected.
pub fn decode_signature(raw: &str) -> Result<[u8; 64], MalformedInputError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(MalformedInputError::Signature {
            reason: "empty".into(),
        });
    }

    let bytes = if let Some(stripped) = s.strip_prefix("0x") {
        hex::decode(stripped).map_err(|e| MalformedInputError::Signature {
            reason: format!("hex decode failed: {}", e),
        })?
    } else if s.len() == SIGNATURE_LENGTH * 2 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
        hex::decode(s).map_err(|e| MalformedInputError::Signature {
            reason: format!("hex decode failed: {}", e),
        })?
    } else {
        base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|_| MalformedInputError::Signature {
                reason: "not hex or base64".into(),
            })?
    };

    if bytes.len() != SIGNATURE_LENGTH {
        return Err(MalformedInputError::Signature {
            reason: format!("expected {} bytes, got {}", SIGNATURE_LENGTH, bytes.len()),
        });
    }

    let mut arr = [0u8; 64];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Parses a hex-encoded public key into a dalek `VerifyingKey`.
///
/// Rejects wrong lengths and bytes that are not a valid curve point —
/// low-order points included. Accepting those would make "verified"
/// meaningless.
fn decode_public_key(raw: &str) -> Result<VerifyingKey, MalformedInputError> {
    let s = raw.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|_| MalformedInputError::PublicKey)?;
    if bytes.len() != VERIFYING_KEY_LENGTH {
        return Err(MalformedInputError::PublicKey);
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    let key = VerifyingKey::from_bytes(&arr).map_err(|_| MalformedInputError::PublicKey)?;
    // Small-order points decompress fine but sign nothing meaningfully.
    if key.is_weak() {
        return Err(MalformedInputError::PublicKey);
    }
    Ok(key)
}

/// Verifies a signed envelope: payload bytes, wire-encoded signature,
/// hex-encoded public key.
///
/// Returns `Ok(true)` when the signature verifies, `Ok(false)` when it
/// does not (forgery, tampering, wrong key), and `Err` only when the
/// inputs cannot be decoded at all. Pure — no side effects, no state.
pub fn verify_envelope(
    payload: &[u8],
    signature: &str,
    public_key: &str,
) -> Result<bool, MalformedInputError> {
    let verifying_key = decode_public_key(public_key)?;
    let sig_bytes = decode_signature(signature)?;
    let sig = DalekSignature::from_bytes(&sig_bytes);
    Ok(verifying_key.verify(payload, &sig).is_ok())
}

/// Verifies a signature already held as raw bytes.
///
/// The "I got these bytes off the wire and need to check them" variant,
/// for callers that bypassed string encodings entirely.
pub fn verify_raw(
    payload: &[u8],
    signature_bytes: &[u8],
    public_key: &str,
) -> Result<bool, MalformedInputError> {
    let verifying_key = decode_public_key(public_key)?;
    let arr: [u8; 64] =
        signature_bytes
            .try_into()
            .map_err(|_| MalformedInputError::Signature {
                reason: format!(
                    "expected {} bytes, got {}",
                    SIGNATURE_LENGTH,
                    signature_bytes.len()
                ),
            })?;
    let sig = DalekSignature::from_bytes(&arr);
    Ok(verifying_key.verify(payload, &sig).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::FluxKeypair;

    fn signed_fixture() -> (FluxKeypair, Vec<u8>, [u8; 64]) {
        let kp = FluxKeypair::generate();
        let payload = b"canonical intent bytes".to_vec();
        let sig = kp.sign(&payload);
        let mut arr = [0u8; 64];
        arr.copy_from_slice(sig.as_bytes());
        (kp, payload, arr)
    }

    #[test]
    fn accepts_0x_hex_signature() {
        let (kp, payload, sig) = signed_fixture();
        let encoded = format!("0x{}", hex::encode(sig));
        let ok = verify_envelope(&payload, &encoded, &kp.public_key_hex()).unwrap();
        assert!(ok);
    }

    #[test]
    fn accepts_bare_hex_signature() {
        let (kp, payload, sig) = signed_fixture();
        let ok = verify_envelope(&payload, &hex::encode(sig), &kp.public_key_hex()).unwrap();
        assert!(ok);
    }

    #[test]
    fn accepts_base64_signature() {
        let (kp, payload, sig) = signed_fixture();
        let encoded = base64::engine::general_purpose::STANDARD.encode(sig);
        let ok = verify_envelope(&payload, &encoded, &kp.public_key_hex()).unwrap();
        assert!(ok);
    }

    #[test]
    fn mismatch_is_false_not_error() {
        let (kp, payload, _) = signed_fixture();
        let other = FluxKeypair::generate();
        let sig = other.sign(&payload);
        let ok = verify_envelope(&payload, &sig.to_hex(), &kp.public_key_hex()).unwrap();
        assert!(!ok);
    }

    #[test]
    fn tampered_payload_is_false() {
        let (kp, mut payload, sig) = signed_fixture();
        payload[0] ^= 0x01; // single-bit mutation
        let ok = verify_envelope(&payload, &hex::encode(sig), &kp.public_key_hex()).unwrap();
        assert!(!ok);
    }

    #[test]
    fn tampered_signature_is_false() {
        let (kp, payload, mut sig) = signed_fixture();
        sig[10] ^= 0x01;
        let ok = verify_envelope(&payload, &hex::encode(sig), &kp.public_key_hex()).unwrap();
        assert!(!ok);
    }

    #[test]
    fn garbage_signature_is_error() {
        let (kp, payload, _) = signed_fixture();
        let err = verify_envelope(&payload, "!!not an encoding!!", &kp.public_key_hex());
        assert!(matches!(
            err,
            Err(MalformedInputError::Signature { .. })
        ));
    }

    #[test]
    fn wrong_length_signature_is_error() {
        let (kp, payload, _) = signed_fixture();
        // Valid hex, wrong byte count.
        let err = verify_envelope(&payload, "0xdeadbeef", &kp.public_key_hex());
        assert!(matches!(
            err,
            Err(MalformedInputError::Signature { .. })
        ));
    }

    #[test]
    fn empty_signature_is_error() {
        let (kp, payload, _) = signed_fixture();
        let err = verify_envelope(&payload, "", &kp.public_key_hex());
        assert!(matches!(
            err,
            Err(MalformedInputError::Signature { .. })
        ));
    }

    #[test]
    fn malformed_public_key_is_error() {
        let (_, payload, sig) = signed_fixture();
        let err = verify_envelope(&payload, &hex::encode(sig), "not-a-key");
        assert!(matches!(err, Err(MalformedInputError::PublicKey)));
    }

    #[test]
    fn all_zero_public_key_is_error() {
        // The identity point is a small-order point and must be rejected
        // at decode time, not silently "verified against".
        let (_, payload, sig) = signed_fixture();
        let zero_key = hex::encode([0u8; 32]);
        let err = verify_envelope(&payload, &hex::encode(sig), &zero_key);
        assert!(matches!(err, Err(MalformedInputError::PublicKey)));
    }

    #[test]
    fn verify_raw_roundtrip() {
        let (kp, payload, sig) = signed_fixture();
        assert!(verify_raw(&payload, &sig, &kp.public_key_hex()).unwrap());
        assert!(matches!(
            verify_raw(&payload, &sig[..32], &kp.public_key_hex()),
            Err(MalformedInputError::Signature { .. })
        ));
    }

    #[test]
    fn public_key_accepts_0x_prefix() {
        let (kp, payload, sig) = signed_fixture();
        let prefixed = format!("0x{}", kp.public_key_hex());
        assert!(verify_envelope(&payload, &hex::encode(sig), &prefixed).unwrap());
    }
}
