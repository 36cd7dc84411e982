// Lucky Draw Client - Utility Functions
use solana_program::pubkey::Pubkey;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{BASIS_POINTS, COIN_DECIMALS, KEEPER_INCENTIVE_BPS, UNITS_PER_COIN};
use crate::error::ValidationError;

/// Source of wall-clock time in milliseconds since the epoch
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Reads the system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Parse a decimal coin amount such as `"0.1"` into base units.
/// Digits beyond the ninth decimal are rejected rather than rounded.
pub fn parse_coins(input: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidAmount(input.to_string());
    let trimmed = input.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if frac.len() > COIN_DECIMALS
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .ok()
            .and_then(|w| w.checked_mul(UNITS_PER_COIN))
            .ok_or_else(invalid)?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = COIN_DECIMALS);
        padded.parse::<u64>().map_err(|_| invalid())?
    };
    whole_units.checked_add(frac_units).ok_or_else(invalid)
}

/// Format base units as a coin amount without trailing zeros, e.g. `0.1`
pub fn format_coins(units: u64) -> String {
    let whole = units / UNITS_PER_COIN;
    let frac = units % UNITS_PER_COIN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac, width = COIN_DECIMALS);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// Abbreviated address for display, e.g. `4Nd1mB...Xy9Q`
pub fn short_address(address: &Pubkey) -> String {
    let s = address.to_string();
    if s.len() <= 10 {
        return s;
    }
    format!("{}...{}", &s[..6], &s[s.len() - 4..])
}

/// Estimated split of a pot between the keeper and the winner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PayoutPreview {
    pub keeper_incentive: u64,
    pub winner_prize: u64,
}

/// Display-only estimate. The draw program computes and enforces the real split.
pub fn payout_preview(reward_balance: u64) -> PayoutPreview {
    let keeper_incentive =
        (reward_balance as u128 * KEEPER_INCENTIVE_BPS as u128 / BASIS_POINTS as u128) as u64;
    PayoutPreview {
        keeper_incentive,
        winner_prize: reward_balance - keeper_incentive,
    }
}
