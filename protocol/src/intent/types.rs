//! Core type definitions for FLUX intents.
//!
//! These are value objects: immutable once created, cheap to clone, and
//! serialized identically on both sides of the wire. The `Intent` struct's
//! field order is part of the signature contract — see
//! [`Intent::canonical_bytes`] — so reordering fields here is a breaking
//! change even though the compiler won't tell you.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// IntentAction
// ---------------------------------------------------------------------------

/// The operation an intent declares.
///
/// Currently a single variant; the tagged representation leaves room for
/// future actions (swaps, escrow releases) without breaking old payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentAction {
    /// Transfer `amount_in` of `token_in` from the signer to the receiver,
    /// optionally expecting `amount_out` of `token_out` on the far side.
    TokenTransfer {
        /// Identity of the paying signer.
        signer_id: String,
        /// Identity of the receiving account.
        receiver_id: String,
        /// Token the signer is paying with.
        token_in: String,
        /// Amount of `token_in`, as a display-unit decimal string. This is
        /// the economically authoritative amount — the only field the
        /// ledger ever credits from.
        amount_in: String,
        /// Token expected on the receiving side.
        token_out: String,
        /// Expected output amount. Advisory; never credited from.
        #[serde(skip_serializing_if = "Option::is_none")]
        amount_out: Option<String>,
    },
}

impl fmt::Display for IntentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenTransfer {
                signer_id,
                receiver_id,
                amount_in,
                token_in,
                ..
            } => write!(
                f,
                "token_transfer {} {} from {} to {}",
                amount_in, token_in, signer_id, receiver_id
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// A signed-intent payload: a declaration of willingness to transfer value.
///
/// Immutable once built. The client serializes it with
/// [`canonical_bytes`](Self::canonical_bytes), signs those bytes, and sends
/// payload + signature + public key as one envelope. The relay consumes it
/// exactly once — the `(account_id, nonce)` pair is burned in the ledger on
/// first credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Payload format version.
    pub version: u16,

    /// Uniqueness token: `{unix_millis}-{random < 1_000_000}`. Makes each
    /// intent instance distinct; replay safety comes from the ledger's
    /// consumed-nonce set, not from this value being secret.
    pub nonce: String,

    /// Absolute expiry instant, Unix milliseconds. The intent is invalid
    /// once `now >= deadline_ms`.
    pub deadline_ms: u64,

    /// What the intent does.
    pub action: IntentAction,

    /// Open, forward-compatible metadata. A `BTreeMap` so serialization
    /// order is stable regardless of insertion order. Never interpreted by
    /// ledger logic — carried into the transaction record verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Intent {
    /// Returns the canonical byte encoding the signature covers.
    ///
    /// Deterministic JSON: struct fields serialize in declaration order and
    /// metadata is a sorted map, so the same intent always encodes to the
    /// same bytes on every platform. JSON (rather than a binary format)
    /// because wallet-side signers speak it natively and a human can read
    /// what they're about to sign.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("intent serialization is infallible")
    }

    /// Canonical encoding as a string, for embedding in a relay request's
    /// `message` field.
    pub fn canonical_string(&self) -> String {
        String::from_utf8(self.canonical_bytes()).expect("canonical JSON is valid UTF-8")
    }

    /// Content-derived identifier: `hex(sha256(canonical_bytes))`.
    /// Stable across signing — useful for logs and transaction metadata.
    pub fn id(&self) -> String {
        let digest = Sha256::digest(self.canonical_bytes());
        hex::encode(digest)
    }

    /// Returns `true` once the deadline has passed (`now >= deadline_ms`).
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// The signer identity declared in the action.
    pub fn signer_id(&self) -> &str {
        match &self.action {
            IntentAction::TokenTransfer { signer_id, .. } => signer_id,
        }
    }

    /// The receiver identity declared in the action.
    pub fn receiver_id(&self) -> &str {
        match &self.action {
            IntentAction::TokenTransfer { receiver_id, .. } => receiver_id,
        }
    }
}
