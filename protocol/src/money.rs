//! # Fixed-Point Money
//!
//! Conversion between human-facing decimal strings (`"50.00"`) and the
//! ledger's integer micro-units (`50_000_000`). Balances are always integer
//! micros internally — floating point never touches money, because
//! `0.1 + 0.2 != 0.3` and we'd like to keep our jobs.
//!
//! Parsing is digit-by-digit with checked arithmetic. Fractions beyond six
//! decimal places are truncated (round toward zero), which matches the
//! crediting rule `round_down(amount * 1_000_000)` exactly without ever
//! computing the multiplication in floating point.

use thiserror::Error;

use crate::config::{BALANCE_DECIMALS, MICROS_PER_UNIT};

/// Errors from decimal-string parsing.
///
/// Each variant names the rule that was violated; callers typically fold
/// these into their own "invalid amount" error with the original string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// The input was empty (or whitespace-only).
    #[error("amount is empty")]
    Empty,

    /// The input carried a leading minus sign. Credits are non-negative
    /// by construction; negative amounts are rejected, never absolut-ized.
    #[error("amount is negative")]
    Negative,

    /// The input contained something other than digits and at most one
    /// decimal point. This includes exponent notation — `1e6` is not money.
    #[error("amount is not a plain decimal number")]
    Malformed,

    /// The value exceeds what a u64 count of micros can hold.
    #[error("amount overflows the ledger's integer range")]
    Overflow,
}

/// Parses a display-unit decimal string into integer micros.
///
/// Accepts plain decimals: `"50"`, `"50.00"`, `"0.5"`, `".5"`. Fractional
/// digits beyond [`BALANCE_DECIMALS`] are truncated — `"0.0000019"` parses
/// to `1` micro. Rejects signs, exponents, group separators, and anything
/// else that isn't `[0-9]` and at most one `.`.
///
/// Returns `Ok(0)` for `"0"` / `"0.0"` — strict positivity is the caller's
/// rule to enforce, not a parsing concern.
pub fn micros_from_display(input: &str) -> Result<u64, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    // A lone "." is not a number; "5." and ".5" are fine.
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Malformed);
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Malformed);
    }

    let mut micros: u64 = 0;
    for b in whole.bytes() {
        micros = micros
            .checked_mul(10)
            .and_then(|m| m.checked_add(u64::from(b - b'0')))
            .ok_or(AmountError::Overflow)?;
    }
    micros = micros.checked_mul(MICROS_PER_UNIT).ok_or(AmountError::Overflow)?;

    // Scale each fractional digit to its micro weight; digits past the
    // sixth place carry weight zero and are truncated.
    let mut weight = MICROS_PER_UNIT / 10;
    for b in frac.bytes().take(BALANCE_DECIMALS as usize) {
        micros = micros
            .checked_add(u64::from(b - b'0') * weight)
            .ok_or(AmountError::Overflow)?;
        weight /= 10;
    }

    Ok(micros)
}

/// Formats integer micros as a display-unit decimal string.
///
/// Trailing zeros in the fraction are trimmed down to a minimum of two
/// places, so balances read like money: `50_000_000` → `"50.00"`,
/// `1_234_567` → `"1.234567"`, `100_000` → `"0.10"`.
pub fn display_from_micros(micros: u64) -> String {
    let whole = micros / MICROS_PER_UNIT;
    let frac = micros % MICROS_PER_UNIT;
    let mut frac_str = format!("{:06}", frac);
    while frac_str.len() > 2 && frac_str.ends_with('0') {
        frac_str.pop();
    }
    format!("{}.{}", whole, frac_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_units() {
        assert_eq!(micros_from_display("50"), Ok(50_000_000));
        assert_eq!(micros_from_display("0"), Ok(0));
    }

    #[test]
    fn parses_decimals() {
        assert_eq!(micros_from_display("50.00"), Ok(50_000_000));
        assert_eq!(micros_from_display("0.5"), Ok(500_000));
        assert_eq!(micros_from_display(".5"), Ok(500_000));
        assert_eq!(micros_from_display("5."), Ok(5_000_000));
        assert_eq!(micros_from_display("1.234567"), Ok(1_234_567));
    }

    #[test]
    fn truncates_past_six_places() {
        // Round toward zero, never up.
        assert_eq!(micros_from_display("0.0000019"), Ok(1));
        assert_eq!(micros_from_display("0.9999999"), Ok(999_999));
    }

    #[test]
    fn rejects_negative() {
        assert_eq!(micros_from_display("-5"), Err(AmountError::Negative));
        assert_eq!(micros_from_display("-0.01"), Err(AmountError::Negative));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(micros_from_display(""), Err(AmountError::Empty));
        assert_eq!(micros_from_display("   "), Err(AmountError::Empty));
        assert_eq!(micros_from_display("."), Err(AmountError::Malformed));
        assert_eq!(micros_from_display("1e6"), Err(AmountError::Malformed));
        assert_eq!(micros_from_display("1,000"), Err(AmountError::Malformed));
        assert_eq!(micros_from_display("1.2.3"), Err(AmountError::Malformed));
        assert_eq!(micros_from_display("NaN"), Err(AmountError::Malformed));
        assert_eq!(micros_from_display("+5"), Err(AmountError::Malformed));
    }

    #[test]
    fn rejects_overflow() {
        // u64::MAX is ~1.8e19; 1e14 display units already overflows micros.
        assert_eq!(
            micros_from_display("99999999999999999999"),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn formats_with_minimum_two_places() {
        assert_eq!(display_from_micros(50_000_000), "50.00");
        assert_eq!(display_from_micros(0), "0.00");
        assert_eq!(display_from_micros(100_000), "0.10");
    }

    #[test]
    fn formats_full_precision_when_needed() {
        assert_eq!(display_from_micros(1_234_567), "1.234567");
        assert_eq!(display_from_micros(1), "0.000001");
    }

    #[test]
    fn display_roundtrip() {
        for micros in [0u64, 1, 42, 999_999, 1_000_000, 50_000_000, 123_456_789] {
            let s = display_from_micros(micros);
            assert_eq!(micros_from_display(&s), Ok(micros), "roundtrip of {}", s);
        }
    }
}
