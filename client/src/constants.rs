use solana_program::{pubkey::Pubkey, sysvar};

/// Status codes stored in the pool account. Must match the program exactly.
pub const STATUS_ACTIVE: u8 = 1;
pub const STATUS_CLOSED: u8 = 2;
pub const STATUS_DRAWN: u8 = 3;

/// PDA seeds used by the draw program
pub const POOL_SEED: &[u8] = b"pool";
pub const RESULT_SEED: &[u8] = b"result";

/// Base units per whole coin (9 decimals)
pub const UNITS_PER_COIN: u64 = 1_000_000_000;
pub const COIN_DECIMALS: usize = 9;

/// 0.1 coin
pub const DEFAULT_TICKET_PRICE: u64 = 100_000_000;

/// Share of the pot paid to whoever triggers the draw, in basis points (1%).
/// Display only; the program computes the real split.
pub const KEEPER_INCENTIVE_BPS: u64 = 100;
pub const BASIS_POINTS: u64 = 10_000;

/// Upper bound on the description the pool account can hold
pub const MAX_DESCRIPTION_LEN: usize = 128;

pub const UNTITLED_DRAW: &str = "Untitled Draw";

pub const COUNTDOWN_TICK_MS: u64 = 1_000;
pub const POOL_POLL_INTERVAL_MS: u64 = 5_000;
pub const REGISTRY_POLL_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_RECONCILE_ATTEMPTS: u32 = 4;
pub const DEFAULT_RECONCILE_INTERVAL_MS: u64 = 2_000;

pub const DAILY_DRAW_DURATION_MS: u64 = 24 * 60 * 60 * 1000;
pub const DAILY_DRAW_PREFIX: &str = "Daily Golden Draw";

/// Shared clock object passed to every state-changing call
pub fn clock_object() -> Pubkey {
    sysvar::clock::id()
}

/// Shared randomness object passed to `execute_draw`
pub fn randomness_object() -> Pubkey {
    sysvar::slot_hashes::id()
}
