//! Cryptographic primitives for FLUX.
//!
//! Two concerns live here, deliberately separated:
//!
//! - [`keys`] — Ed25519 keypair generation and signing. This is the
//!   client/"wallet" side of the protocol: intents are signed with these
//!   keys before they ever reach a relay.
//! - [`verify`] — the relay-side signature gate. Takes whatever encoding
//!   arrived on the wire (hex, base64, raw bytes), a claimed public key,
//!   and the payload, and answers a plain yes/no.
//!
//! Keeping signing and verification in separate modules means the relay
//! request path never touches secret key material.

pub mod keys;
pub mod verify;

pub use keys::{FluxKeypair, FluxPublicKey, FluxSignature, KeyError};
pub use verify::{verify_envelope, MalformedInputError};
