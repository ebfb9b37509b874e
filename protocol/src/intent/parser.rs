//! Relay-side intent parsing and temporal validation.
//!
//! Runs *after* the signature gate: by the time these functions see a
//! payload, we already know the claimed signer produced it. The job here
//! is structural — turn the canonical bytes back into an [`Intent`],
//! extract the economically authoritative amount, and enforce the
//! deadline.
//!
//! The amount comes from `action.amount_in` and nowhere else. Metadata,
//! memos, and `amount_out` are never credited from, no matter what
//! numbers they contain.

use chrono::Utc;
use thiserror::Error;

use crate::money::{self, AmountError};

use super::types::{Intent, IntentAction};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural parsing failures. All map to "reject the request" at the
/// relay boundary.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not a valid intent document.
    #[error("malformed intent payload: {reason}")]
    MalformedPayload { reason: String },

    /// The action carries no usable amount.
    #[error("intent action is missing an amount")]
    AmountMissing,

    /// The amount field exists but is not a positive decimal.
    #[error("invalid intent amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: AmountError },

    /// The amount parsed to zero. Nothing to credit.
    #[error("intent amount {value:?} is zero")]
    ZeroAmount { value: String },
}

/// The deadline has passed. Deliberately its own type rather than a
/// `ParseError` variant: an expired intent was structurally fine and
/// correctly signed, and callers map it to a different rejection class.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("intent expired: deadline {deadline_ms} ms, now {now_ms} ms")]
pub struct ExpiredIntentError {
    /// The intent's declared expiry instant.
    pub deadline_ms: u64,
    /// The clock reading at validation time.
    pub now_ms: u64,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Parses canonical intent JSON back into an [`Intent`].
///
/// Missing required fields and type mismatches surface as
/// `MalformedPayload` with serde's reason attached. Unknown fields are
/// tolerated for forward compatibility.
pub fn parse_intent(payload: &str) -> Result<Intent, ParseError> {
    serde_json::from_str(payload).map_err(|e| ParseError::MalformedPayload {
        reason: e.to_string(),
    })
}

/// Extracts the credit amount from an intent's action.
///
/// Returns the amount in micros alongside the token it is denominated
/// in. Only `amount_in` is consulted; an empty or whitespace value is
/// `AmountMissing`, an unparseable or zero value is rejected.
pub fn extract_amount(intent: &Intent) -> Result<(u64, String), ParseError> {
    let IntentAction::TokenTransfer {
        amount_in, token_in, ..
    } = &intent.action;

    if amount_in.trim().is_empty() {
        return Err(ParseError::AmountMissing);
    }

    let micros = money::micros_from_display(amount_in).map_err(|reason| {
        ParseError::InvalidAmount {
            value: amount_in.clone(),
            reason,
        }
    })?;
    if micros == 0 {
        return Err(ParseError::ZeroAmount {
            value: amount_in.clone(),
        });
    }
    Ok((micros, token_in.clone()))
}

/// Checks the intent's deadline against the wall clock.
///
/// Valid iff `now < deadline_ms`. Exactly at the deadline counts as
/// expired.
pub fn ensure_unexpired(intent: &Intent) -> Result<(), ExpiredIntentError> {
    let now_ms = Utc::now().timestamp_millis() as u64;
    ensure_unexpired_at(intent, now_ms)
}

/// Deadline check against an explicit clock reading. The testable core
/// of [`ensure_unexpired`].
pub fn ensure_unexpired_at(intent: &Intent, now_ms: u64) -> Result<(), ExpiredIntentError> {
    if intent.is_expired_at(now_ms) {
        return Err(ExpiredIntentError {
            deadline_ms: intent.deadline_ms,
            now_ms,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentBuilder;

    fn sample_intent() -> Intent {
        IntentBuilder::new()
            .signer_id("alice")
            .receiver_id("bob")
            .token_in("USDT")
            .amount_in("50.00")
            .token_out("USDT")
            .build()
            .unwrap()
    }

    #[test]
    fn parse_roundtrips_canonical_form() {
        let intent = sample_intent();
        let parsed = parse_intent(&intent.canonical_string()).unwrap();
        assert_eq!(parsed, intent);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_intent("this is not json").unwrap_err();
        assert!(matches!(err, ParseError::MalformedPayload { .. }));
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        let err = parse_intent(r#"{"hello": "world"}"#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedPayload { .. }));
    }

    #[test]
    fn extract_reads_amount_in() {
        let intent = sample_intent();
        let (micros, token) = extract_amount(&intent).unwrap();
        assert_eq!(micros, 50_000_000);
        assert_eq!(token, "USDT");
    }

    #[test]
    fn extract_ignores_amount_out() {
        let mut intent = sample_intent();
        let IntentAction::TokenTransfer { amount_out, .. } = &mut intent.action;
        *amount_out = Some("9999999".into());
        let (micros, _) = extract_amount(&intent).unwrap();
        assert_eq!(micros, 50_000_000);
    }

    #[test]
    fn extract_ignores_metadata_numbers() {
        let mut intent = sample_intent();
        intent
            .metadata
            .insert("amount".into(), serde_json::json!("1000000"));
        let (micros, _) = extract_amount(&intent).unwrap();
        assert_eq!(micros, 50_000_000);
    }

    #[test]
    fn extract_truncates_past_six_decimals() {
        let mut intent = sample_intent();
        let IntentAction::TokenTransfer { amount_in, .. } = &mut intent.action;
        *amount_in = "0.12345678".into();
        let (micros, _) = extract_amount(&intent).unwrap();
        assert_eq!(micros, 123_456);
    }

    #[test]
    fn extract_missing_amount() {
        let mut intent = sample_intent();
        let IntentAction::TokenTransfer { amount_in, .. } = &mut intent.action;
        *amount_in = "  ".into();
        assert!(matches!(
            extract_amount(&intent).unwrap_err(),
            ParseError::AmountMissing
        ));
    }

    #[test]
    fn extract_rejects_negative() {
        let mut intent = sample_intent();
        let IntentAction::TokenTransfer { amount_in, .. } = &mut intent.action;
        *amount_in = "-5".into();
        assert!(matches!(
            extract_amount(&intent).unwrap_err(),
            ParseError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn extract_rejects_non_numeric() {
        let mut intent = sample_intent();
        let IntentAction::TokenTransfer { amount_in, .. } = &mut intent.action;
        *amount_in = "fifty dollars".into();
        assert!(matches!(
            extract_amount(&intent).unwrap_err(),
            ParseError::InvalidAmount { .. }
        ));
    }

    #[test]
    fn extract_rejects_zero() {
        let mut intent = sample_intent();
        let IntentAction::TokenTransfer { amount_in, .. } = &mut intent.action;
        *amount_in = "0.000000".into();
        assert!(matches!(
            extract_amount(&intent).unwrap_err(),
            ParseError::ZeroAmount { .. }
        ));
    }

    #[test]
    fn fresh_intent_is_unexpired() {
        let intent = sample_intent();
        assert!(ensure_unexpired(&intent).is_ok());
    }

    #[test]
    fn expiry_is_exact_at_deadline() {
        let intent = sample_intent();
        assert!(ensure_unexpired_at(&intent, intent.deadline_ms - 1).is_ok());

        let err = ensure_unexpired_at(&intent, intent.deadline_ms).unwrap_err();
        assert_eq!(err.deadline_ms, intent.deadline_ms);
        assert_eq!(err.now_ms, intent.deadline_ms);
    }

    #[test]
    fn one_ms_past_deadline_is_expired() {
        let intent = sample_intent();
        let err = ensure_unexpired_at(&intent, intent.deadline_ms + 1).unwrap_err();
        assert_eq!(err.now_ms, intent.deadline_ms + 1);
    }
}
