//! Wire types for the relay endpoint.
//!
//! Request fields are `Option<String>` on purpose: deserialization
//! accepts any shape so the service layer can report exactly which
//! field is missing, instead of a generic body-rejected error from the
//! HTTP framework.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Raw relay submission as received off the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    /// Account to credit.
    pub account_id: Option<String>,
    /// Canonical intent JSON, exactly the bytes that were signed.
    pub message: Option<String>,
    /// Signature over `message`, hex (with or without `0x`) or base64.
    pub signature: Option<String>,
    /// Signer's Ed25519 public key, hex.
    pub public_key: Option<String>,
}

/// A structurally complete submission: every field present. Produced by
/// [`RelayRequest::into_envelope`]; holding one means the presence gate
/// has passed, nothing more.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
    pub account_id: String,
    pub message: String,
    pub signature: String,
    pub public_key: String,
}

impl RelayRequest {
    /// Checks field presence, returning the name of the first missing
    /// or empty field on failure.
    pub fn into_envelope(self) -> Result<SignedEnvelope, &'static str> {
        let account_id = require(self.account_id, "accountId")?;
        let message = require(self.message, "message")?;
        let signature = require(self.signature, "signature")?;
        let public_key = require(self.public_key, "publicKey")?;
        Ok(SignedEnvelope {
            account_id,
            message,
            signature,
            public_key,
        })
    }
}

fn require(field: Option<String>, name: &'static str) -> Result<String, &'static str> {
    match field {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(name),
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Condensed view of the appended ledger record, echoed back to the
/// submitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: String,
    pub amount: String,
    pub amount_micros: u64,
    pub token: String,
    pub intent_id: String,
}

/// Successful relay response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub success: bool,
    pub account_id: String,
    /// New balance in display units, e.g. `"50.00"`.
    pub new_balance: String,
    /// New balance in micros, for callers that do math.
    pub new_balance_micros: u64,
    pub transaction: TransactionSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> RelayRequest {
        RelayRequest {
            account_id: Some("alice".into()),
            message: Some("{}".into()),
            signature: Some("00".into()),
            public_key: Some("11".into()),
        }
    }

    #[test]
    fn complete_request_converts() {
        let envelope = full_request().into_envelope().unwrap();
        assert_eq!(envelope.account_id, "alice");
    }

    #[test]
    fn missing_fields_named_in_order() {
        let mut req = full_request();
        req.account_id = None;
        assert_eq!(req.into_envelope().unwrap_err(), "accountId");

        let mut req = full_request();
        req.message = Some("   ".into());
        assert_eq!(req.into_envelope().unwrap_err(), "message");

        let mut req = full_request();
        req.signature = None;
        assert_eq!(req.into_envelope().unwrap_err(), "signature");

        let mut req = full_request();
        req.public_key = Some(String::new());
        assert_eq!(req.into_envelope().unwrap_err(), "publicKey");
    }

    #[test]
    fn wire_names_are_camel_case() {
        let parsed: RelayRequest = serde_json::from_str(
            r#"{"accountId":"a","message":"m","signature":"s","publicKey":"p"}"#,
        )
        .unwrap();
        assert_eq!(parsed.account_id.as_deref(), Some("a"));
        assert_eq!(parsed.public_key.as_deref(), Some("p"));
    }
}
