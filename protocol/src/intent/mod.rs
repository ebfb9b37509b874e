//! Intent construction, canonical serialization, and parsing.
//!
//! An intent is a signed declaration of a desired value transfer — not
//! itself a settlement. The client builds one with [`builder::IntentBuilder`],
//! serializes it canonically, signs the bytes, and sends the whole envelope
//! to a relay. The relay parses it back with [`parser`] after the signature
//! gate has passed.
//!
//! The serialization contract is the load-bearing part: signer and verifier
//! must produce and consume the *exact same byte sequence*, or signatures
//! become meaningless. See [`types::Intent::canonical_bytes`].

pub mod builder;
pub mod parser;
pub mod types;

pub use builder::{IntentBuilder, ValidationError};
pub use parser::{ensure_unexpired, extract_amount, parse_intent, ExpiredIntentError, ParseError};
pub use types::{Intent, IntentAction};
