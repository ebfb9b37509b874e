//! # Protocol Configuration & Constants
//!
//! Every magic number in FLUX lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are baked into the wire format or the ledger's
//! on-disk representation. Changing them after envelopes exist in the wild
//! is somewhere between "difficult" and "career-ending", so choose wisely.

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Number of implied decimal places in a ledger balance. Balances are stored
/// as integer counts of the smallest unit — one micro, 1e-6 of the display
/// currency. Same precision as USDC, for the same reason: it's enough.
pub const BALANCE_DECIMALS: u32 = 6;

/// Micros per display unit. `1.00` in display units is exactly this many
/// micros. Keep in sync with [`BALANCE_DECIMALS`] or face the wrath of
/// the money tests.
pub const MICROS_PER_UNIT: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Intents
// ---------------------------------------------------------------------------

/// Intent payload format version. Bump on any change to the canonical
/// serialization — verifiers must reproduce the exact byte sequence the
/// signer produced, so format drift is a signature-breaking change.
pub const INTENT_VERSION: u16 = 1;

/// Default intent lifetime when the builder isn't told otherwise.
/// 30 minutes is generous for a payment flow; anything still unsubmitted
/// after that deserves to die.
pub const DEFAULT_DEADLINE_MINUTES: i64 = 30;

/// Exclusive upper bound for the random suffix in a nonce. One million
/// values on top of millisecond timestamps gives a comfortably low
/// birthday-collision probability for same-millisecond intents. This is a
/// uniqueness aid, NOT an unguessable token — replay safety comes from the
/// ledger's consumed-nonce set, not from nonce secrecy.
pub const NONCE_RANDOM_RANGE: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 — deterministic signatures, 128-bit security, no k-value
/// footguns. The only sane choice.
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Ed25519 secret keys are 32 bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default port for the relay HTTP API.
pub const DEFAULT_RELAY_PORT: u16 = 8460;

/// Default port for the Prometheus metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 8461;

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// The protocol version string, assembled at compile time so we don't
/// allocate for something this trivial at runtime.
pub const PROTOCOL_VERSION: &str = "0.1.0";
