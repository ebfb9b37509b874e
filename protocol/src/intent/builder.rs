//! Intent construction via the builder pattern.
//!
//! The [`IntentBuilder`] enforces a disciplined construction flow: set the
//! required fields, call `.build()`, and get back a validated [`Intent`]
//! with a fresh nonce and an absolute deadline. Validation failures return
//! a [`ValidationError`] naming the offending field — no partial intent
//! ever escapes.
//!
//! The builder does not sign — that happens with the keypair in
//! [`crate::crypto::keys`]. This separation keeps construction testable
//! without key material.

use std::collections::BTreeMap;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;

use crate::config::{DEFAULT_DEADLINE_MINUTES, INTENT_VERSION, NONCE_RANDOM_RANGE};
use crate::money::{self, AmountError};

use super::types::{Intent, IntentAction};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from intent construction. Surfaced to the caller before anything
/// is signed or sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty. Carries the field name so the caller
    /// can point at the exact input.
    #[error("required field is empty: {field}")]
    EmptyField { field: &'static str },

    /// `amount_in` is not a strictly positive decimal.
    #[error("invalid amount_in {value:?}: {reason}")]
    InvalidAmount { value: String, reason: AmountError },

    /// `amount_in` parsed fine but is zero. Zero-value intents are noise
    /// at best and log spam at worst.
    #[error("amount_in must be strictly positive, got {value:?}")]
    ZeroAmount { value: String },

    /// The deadline offset must be positive — an intent born expired is
    /// a caller bug, not a payload.
    #[error("deadline_minutes must be > 0, got {minutes}")]
    NonPositiveDeadline { minutes: i64 },
}

// ---------------------------------------------------------------------------
// IntentBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Intent`] values.
///
/// # Usage
///
/// ```
/// use flux_protocol::intent::IntentBuilder;
///
/// let intent = IntentBuilder::new()
///     .signer_id("alice")
///     .receiver_id("bob")
///     .token_in("USDT")
///     .amount_in("50.00")
///     .token_out("USDT")
///     .build()
///     .expect("valid inputs");
///
/// assert_eq!(intent.signer_id(), "alice");
/// ```
///
/// Defaults: deadline 30 minutes from now, empty metadata, no `amount_out`.
#[derive(Debug, Default, Clone)]
pub struct IntentBuilder {
    signer_id: String,
    receiver_id: String,
    token_in: String,
    amount_in: String,
    token_out: String,
    amount_out: Option<String>,
    deadline_minutes: Option<i64>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl IntentBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paying signer's identity.
    pub fn signer_id(mut self, id: &str) -> Self {
        self.signer_id = id.to_string();
        self
    }

    /// Sets the receiving account's identity.
    pub fn receiver_id(mut self, id: &str) -> Self {
        self.receiver_id = id.to_string();
        self
    }

    /// Sets the token being paid.
    pub fn token_in(mut self, token: &str) -> Self {
        self.token_in = token.to_string();
        self
    }

    /// Sets the payment amount as a display-unit decimal string.
    pub fn amount_in(mut self, amount: &str) -> Self {
        self.amount_in = amount.to_string();
        self
    }

    /// Sets the token expected on the receiving side.
    pub fn token_out(mut self, token: &str) -> Self {
        self.token_out = token.to_string();
        self
    }

    /// Sets the expected output amount. Advisory only.
    pub fn amount_out(mut self, amount: &str) -> Self {
        self.amount_out = Some(amount.to_string());
        self
    }

    /// Overrides the deadline offset in minutes (default 30).
    pub fn deadline_minutes(mut self, minutes: i64) -> Self {
        self.deadline_minutes = Some(minutes);
        self
    }

    /// Attaches a metadata entry. Opaque to the ledger.
    pub fn metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Validates the inputs and produces an [`Intent`].
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// `signer_id`, `receiver_id`, `token_in`, `token_out`, `amount_in`
    /// non-empty, then `amount_in` must parse to a strictly positive
    /// decimal. On success the intent carries a fresh nonce and an
    /// absolute deadline.
    pub fn build(self) -> Result<Intent, ValidationError> {
        for (field, value) in [
            ("signer_id", &self.signer_id),
            ("receiver_id", &self.receiver_id),
            ("token_in", &self.token_in),
            ("token_out", &self.token_out),
            ("amount_in", &self.amount_in),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField { field });
            }
        }

        let micros =
            money::micros_from_display(&self.amount_in).map_err(|reason| {
                ValidationError::InvalidAmount {
                    value: self.amount_in.clone(),
                    reason,
                }
            })?;
        if micros == 0 {
            return Err(ValidationError::ZeroAmount {
                value: self.amount_in.clone(),
            });
        }

        let minutes = self.deadline_minutes.unwrap_or(DEFAULT_DEADLINE_MINUTES);
        if minutes <= 0 {
            return Err(ValidationError::NonPositiveDeadline { minutes });
        }

        let now_ms = Utc::now().timestamp_millis() as u64;
        Ok(Intent {
            version: INTENT_VERSION,
            nonce: generate_nonce(now_ms),
            deadline_ms: now_ms + (minutes as u64) * 60_000,
            action: IntentAction::TokenTransfer {
                signer_id: self.signer_id,
                receiver_id: self.receiver_id,
                token_in: self.token_in,
                amount_in: self.amount_in,
                token_out: self.token_out,
                amount_out: self.amount_out,
            },
            metadata: self.metadata,
        })
    }
}

/// Generates a nonce: current milliseconds plus a random suffix in
/// `[0, NONCE_RANDOM_RANGE)`. Low-collision, not unguessable — pair it
/// with the ledger's consumed-nonce set for actual replay safety.
fn generate_nonce(now_ms: u64) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..NONCE_RANDOM_RANGE);
    format!("{}-{}", now_ms, suffix)
}
