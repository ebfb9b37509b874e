//! The relay pipeline: gate by gate, from raw request to ledger credit.
//!
//! Gate order is a contract, not an implementation detail:
//!
//! 1. **Presence** — all four fields supplied.
//! 2. **Signature** — the payload verifies against the supplied key.
//! 3. **Structure** — the payload parses and carries a positive amount.
//! 4. **Deadline** — the intent has not expired.
//! 5. **Credit** — atomic balance update, record append, nonce burn.
//!
//! Nothing downstream of a failed gate runs, so an unverified payload is
//! never parsed and an expired intent never reaches the ledger. The
//! ledger mutation is the *last* step; every rejection leaves state
//! untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::crypto::{self, MalformedInputError};
use crate::intent::{self, ExpiredIntentError, Intent, ParseError};
use crate::ledger::{LedgerError, LedgerStore};
use crate::money;

use super::envelope::{RelayRequest, RelayResponse, SignedEnvelope, TransactionSummary};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Every way a relay submission can be refused. The HTTP layer maps
/// these to status codes; the pipeline itself is transport-agnostic.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required request field was absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Signature or key could not even be decoded.
    #[error(transparent)]
    MalformedInput(#[from] MalformedInputError),

    /// Inputs decoded fine but the signature does not cover the payload.
    #[error("signature verification failed")]
    Unauthorized,

    /// The payload is not a structurally valid intent.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Correctly signed, correctly shaped, too late.
    #[error(transparent)]
    Expired(#[from] ExpiredIntentError),

    /// This intent's nonce was already consumed.
    #[error("intent already processed: account {account_id}, nonce {nonce}")]
    Replayed { account_id: String, nonce: String },

    /// Storage-layer failure. Details go to logs, not to clients.
    #[error("internal ledger error")]
    Internal(#[source] LedgerError),
}

impl From<LedgerError> for RelayError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateIntent { account_id, nonce } => {
                Self::Replayed { account_id, nonce }
            }
            other => Self::Internal(other),
        }
    }
}

impl RelayError {
    /// Stable snake_case label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::MalformedInput(_) => "malformed_input",
            Self::Unauthorized => "unauthorized",
            Self::Parse(_) => "parse",
            Self::Expired(_) => "expired",
            Self::Replayed { .. } => "replayed",
            Self::Internal(_) => "internal",
        }
    }
}

// ---------------------------------------------------------------------------
// RelayService
// ---------------------------------------------------------------------------

/// Stateless pipeline executor over a shared ledger.
#[derive(Debug, Clone)]
pub struct RelayService {
    ledger: Arc<LedgerStore>,
}

impl RelayService {
    pub fn new(ledger: Arc<LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Runs a submission through the full gate sequence.
    ///
    /// Returns the credit receipt, or the first gate failure. Exactly
    /// one ledger mutation happens on success; none on any failure.
    pub fn process(&self, request: RelayRequest) -> Result<RelayResponse, RelayError> {
        let envelope = request.into_envelope().map_err(RelayError::MissingField)?;

        let verified = crypto::verify_envelope(
            envelope.message.as_bytes(),
            &envelope.signature,
            &envelope.public_key,
        )?;
        if !verified {
            warn!(account = %envelope.account_id, "rejected: signature mismatch");
            return Err(RelayError::Unauthorized);
        }

        let parsed = intent::parse_intent(&envelope.message)?;
        let (amount_micros, token) = intent::extract_amount(&parsed)?;
        intent::ensure_unexpired(&parsed)?;

        self.credit(&envelope, &parsed, amount_micros, token)
    }

    fn credit(
        &self,
        envelope: &SignedEnvelope,
        parsed: &Intent,
        amount_micros: u64,
        token: String,
    ) -> Result<RelayResponse, RelayError> {
        let intent_id = parsed.id();
        let mut metadata = BTreeMap::new();
        metadata.insert("intent_id".to_string(), serde_json::json!(intent_id));
        metadata.insert("nonce".to_string(), serde_json::json!(parsed.nonce));
        metadata.insert("token".to_string(), serde_json::json!(token));
        metadata.insert(
            "signer_id".to_string(),
            serde_json::json!(parsed.signer_id()),
        );

        let (account, record) = self.ledger.credit_intent(
            &envelope.account_id,
            amount_micros,
            &parsed.nonce,
            &intent_id,
            metadata,
        )?;

        info!(
            account = %account.account_id,
            amount_micros,
            balance_micros = account.balance_micros,
            intent_id = %intent_id,
            "intent relayed"
        );

        Ok(RelayResponse {
            success: true,
            account_id: account.account_id,
            new_balance: money::display_from_micros(account.balance_micros),
            new_balance_micros: account.balance_micros,
            transaction: TransactionSummary {
                id: record.id,
                amount: money::display_from_micros(amount_micros),
                amount_micros,
                token,
                intent_id,
            },
        })
    }

    /// The ledger this service credits into.
    pub fn ledger(&self) -> &Arc<LedgerStore> {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::FluxKeypair;
    use crate::intent::IntentBuilder;

    fn service() -> RelayService {
        RelayService::new(Arc::new(LedgerStore::open_temporary().unwrap()))
    }

    fn signed_request(keypair: &FluxKeypair, intent: &Intent, account: &str) -> RelayRequest {
        let message = intent.canonical_string();
        let signature = keypair.sign(message.as_bytes());
        RelayRequest {
            account_id: Some(account.into()),
            message: Some(message),
            signature: Some(signature.to_hex()),
            public_key: Some(keypair.public_key_hex()),
        }
    }

    fn sample_intent(amount: &str) -> Intent {
        IntentBuilder::new()
            .signer_id("alice")
            .receiver_id("bob")
            .token_in("USDT")
            .amount_in(amount)
            .token_out("USDT")
            .build()
            .unwrap()
    }

    #[test]
    fn happy_path_credits_fifty() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let intent = sample_intent("50.00");

        let response = service
            .process(signed_request(&keypair, &intent, "alice"))
            .unwrap();

        assert!(response.success);
        assert_eq!(response.account_id, "alice");
        assert_eq!(response.new_balance, "50.00");
        assert_eq!(response.new_balance_micros, 50_000_000);
        assert_eq!(response.transaction.amount_micros, 50_000_000);
        assert_eq!(response.transaction.token, "USDT");
        assert_eq!(response.transaction.intent_id, intent.id());

        assert_eq!(service.ledger().balance_micros("alice").unwrap(), 50_000_000);
    }

    #[test]
    fn base64_signature_accepted() {
        use base64::Engine;
        let service = service();
        let keypair = FluxKeypair::generate();
        let intent = sample_intent("1.50");

        let mut request = signed_request(&keypair, &intent, "alice");
        let message = request.message.clone().unwrap();
        let sig = keypair.sign(message.as_bytes());
        request.signature =
            Some(base64::engine::general_purpose::STANDARD.encode(sig.as_bytes()));

        let response = service.process(request).unwrap();
        assert_eq!(response.new_balance_micros, 1_500_000);
    }

    #[test]
    fn missing_field_rejected() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let intent = sample_intent("50.00");

        let mut request = signed_request(&keypair, &intent, "alice");
        request.signature = None;

        let err = service.process(request).unwrap_err();
        assert!(matches!(err, RelayError::MissingField("signature")));
    }

    #[test]
    fn wrong_key_is_unauthorized_and_writes_nothing() {
        let service = service();
        let signer = FluxKeypair::generate();
        let imposter = FluxKeypair::generate();
        let intent = sample_intent("50.00");

        // Signed by one key, claiming another.
        let mut request = signed_request(&signer, &intent, "alice");
        request.public_key = Some(imposter.public_key_hex());

        let err = service.process(request).unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
        assert!(service.ledger().get_account("alice").unwrap().is_none());
    }

    #[test]
    fn tampered_message_is_unauthorized() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let intent = sample_intent("50.00");

        let mut request = signed_request(&keypair, &intent, "alice");
        let tampered = request
            .message
            .clone()
            .unwrap()
            .replace("50.00", "5000.00");
        request.message = Some(tampered);

        let err = service.process(request).unwrap_err();
        assert!(matches!(err, RelayError::Unauthorized));
    }

    #[test]
    fn garbage_signature_is_malformed_not_unauthorized() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let intent = sample_intent("50.00");

        let mut request = signed_request(&keypair, &intent, "alice");
        request.signature = Some("!!garbage!!".into());

        let err = service.process(request).unwrap_err();
        assert!(matches!(err, RelayError::MalformedInput(_)));
    }

    #[test]
    fn signed_garbage_payload_is_parse_error() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let message = "not an intent at all".to_string();
        let signature = keypair.sign(message.as_bytes());

        let request = RelayRequest {
            account_id: Some("alice".into()),
            message: Some(message),
            signature: Some(signature.to_hex()),
            public_key: Some(keypair.public_key_hex()),
        };

        let err = service.process(request).unwrap_err();
        assert!(matches!(err, RelayError::Parse(_)));
    }

    #[test]
    fn negative_amount_rejected() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let mut intent = sample_intent("50.00");
        let crate::intent::IntentAction::TokenTransfer { amount_in, .. } = &mut intent.action;
        *amount_in = "-5".into();

        let err = service
            .process(signed_request(&keypair, &intent, "alice"))
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::Parse(ParseError::InvalidAmount { .. })
        ));
        assert!(service.ledger().get_account("alice").unwrap().is_none());
    }

    #[test]
    fn expired_intent_rejected_without_mutation() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let mut intent = sample_intent("50.00");
        // 1 ms in the past.
        intent.deadline_ms = (chrono::Utc::now().timestamp_millis() as u64) - 1;

        let err = service
            .process(signed_request(&keypair, &intent, "alice"))
            .unwrap_err();
        assert!(matches!(err, RelayError::Expired(_)));
        assert!(service.ledger().get_account("alice").unwrap().is_none());
    }

    #[test]
    fn replay_rejected_and_balance_unchanged() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let intent = sample_intent("50.00");

        service
            .process(signed_request(&keypair, &intent, "alice"))
            .unwrap();

        // Byte-identical resubmission, still perfectly signed.
        let err = service
            .process(signed_request(&keypair, &intent, "alice"))
            .unwrap_err();
        assert!(matches!(err, RelayError::Replayed { .. }));
        assert_eq!(service.ledger().balance_micros("alice").unwrap(), 50_000_000);
        assert_eq!(service.ledger().transactions_for("alice").unwrap().len(), 1);
    }

    #[test]
    fn distinct_intents_same_account_both_credit() {
        let service = service();
        let keypair = FluxKeypair::generate();

        service
            .process(signed_request(&keypair, &sample_intent("50.00"), "alice"))
            .unwrap();
        let response = service
            .process(signed_request(&keypair, &sample_intent("0.50"), "alice"))
            .unwrap();

        assert_eq!(response.new_balance_micros, 50_500_000);
        assert_eq!(response.new_balance, "50.50");
    }

    #[test]
    fn transaction_record_carries_intent_metadata() {
        let service = service();
        let keypair = FluxKeypair::generate();
        let intent = sample_intent("2.00");

        service
            .process(signed_request(&keypair, &intent, "alice"))
            .unwrap();

        let records = service.ledger().transactions_for("alice").unwrap();
        assert_eq!(records[0].metadata["intent_id"], intent.id());
        assert_eq!(records[0].metadata["nonce"], intent.nonce);
        assert_eq!(records[0].metadata["token"], "USDT");
        assert_eq!(records[0].metadata["signer_id"], "alice");
    }

    #[test]
    fn error_reasons_are_stable() {
        assert_eq!(RelayError::MissingField("x").reason(), "missing_field");
        assert_eq!(RelayError::Unauthorized.reason(), "unauthorized");
        assert_eq!(
            RelayError::Replayed {
                account_id: "a".into(),
                nonce: "n".into()
            }
            .reason(),
            "replayed"
        );
    }
}
