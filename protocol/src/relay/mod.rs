//! The relay pipeline: accept a signed envelope, verify it, credit it.
//!
//! [`service::RelayService`] is the transport-agnostic core; the HTTP
//! surface in the `flux-relay` binary is a thin adapter over it.

pub mod envelope;
pub mod service;

pub use envelope::{RelayRequest, RelayResponse, SignedEnvelope, TransactionSummary};
pub use service::{RelayError, RelayService};
