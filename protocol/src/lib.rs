// Copyright (c) 2026 Flux Labs. MIT License.
// See LICENSE for details.

//! # FLUX Protocol — Core Library
//!
//! FLUX lets a user express a payment as a signed, off-chain *intent* — a
//! declaration of willingness to transfer value — instead of a direct
//! on-chain transaction. A relay service validates that intent and applies
//! its effect to an internal ledger. No settlement, no routing, no chain
//! submission: just the verification and crediting pipeline, done carefully,
//! because money-moving logic tolerates no ambiguity.
//!
//! The pipeline is a straight line with hard gates:
//!
//! ```text
//! client builds Intent → signs it → relay receives {payload, sig, pubkey}
//!     → SignatureVerifier gate → IntentParser gate → LedgerStore credit
//!     → response
//! ```
//!
//! ## Architecture
//!
//! - **crypto** — Ed25519 keys, signing, and the multi-encoding signature
//!   verifier. Don't roll your own.
//! - **intent** — Intent construction, canonical serialization, and the
//!   parser that extracts money amounts from *structured* fields only.
//! - **money** — Fixed-point micro-unit arithmetic. No floats near money.
//! - **ledger** — Per-account balances and append-only transaction logs
//!   over sled, with atomic credit + replay protection.
//! - **relay** — The orchestrator tying the gates together, and the wire
//!   types the HTTP layer speaks.
//! - **config** — Protocol constants. Every magic number lives here.
//!
//! ## Design Philosophy
//!
//! 1. A failed gate is terminal for the request. No internal retries.
//! 2. Balance update and transaction append are one atomic write —
//!    a crash between them must be structurally impossible.
//! 3. The same signed envelope never credits twice.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod intent;
pub mod ledger;
pub mod money;
pub mod relay;
