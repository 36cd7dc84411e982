// Lucky Draw Client - Configuration
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    COUNTDOWN_TICK_MS, DAILY_DRAW_DURATION_MS, DEFAULT_TICKET_PRICE, POOL_POLL_INTERVAL_MS,
    REGISTRY_POLL_INTERVAL_MS,
};
use crate::error::ConfigError;
use crate::settlement::RetryPolicy;

pub const ENV_PROGRAM_ID: &str = "LUCKYDRAW_PROGRAM_ID";
pub const ENV_POLL_INTERVAL_MS: &str = "LUCKYDRAW_POLL_INTERVAL_MS";
pub const ENV_RECONCILE_ATTEMPTS: &str = "LUCKYDRAW_RECONCILE_ATTEMPTS";
pub const ENV_RECONCILE_INTERVAL_MS: &str = "LUCKYDRAW_RECONCILE_INTERVAL_MS";
pub const ENV_AGENT_KEYPAIR: &str = "AGENT_KEYPAIR";

/// Client settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Address of the deployed draw program
    pub program_id: Pubkey,
    /// How often a displayed pool is re-read
    pub poll_interval: Duration,
    /// How often the pool list is rebuilt from events
    pub registry_interval: Duration,
    /// Countdown refresh rate
    pub countdown_tick: Duration,
    /// Re-reads after a confirmed transaction
    pub reconcile: RetryPolicy,
}

impl ClientConfig {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            poll_interval: Duration::from_millis(POOL_POLL_INTERVAL_MS),
            registry_interval: Duration::from_millis(REGISTRY_POLL_INTERVAL_MS),
            countdown_tick: Duration::from_millis(COUNTDOWN_TICK_MS),
            reconcile: RetryPolicy::default(),
        }
    }

    /// Load from the environment. Only the program id is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let program_id = required(ENV_PROGRAM_ID)?;
        let mut config = Self::new(program_id);

        if let Some(ms) = optional::<u64>(ENV_POLL_INTERVAL_MS)? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = optional::<u32>(ENV_RECONCILE_ATTEMPTS)? {
            config.reconcile.max_attempts = attempts;
        }
        if let Some(ms) = optional::<u64>(ENV_RECONCILE_INTERVAL_MS)? {
            config.reconcile.interval = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

/// Settings for the automation agent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeeperConfig {
    /// Ticket price of the scheduled daily draw
    pub ticket_price: u64,
    /// Lifetime of the scheduled daily draw
    pub duration_ms: u64,
    /// How often to look for pools ready to draw
    pub sweep_interval: Duration,
    /// How often to open a new daily draw
    pub create_interval: Duration,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            ticket_price: DEFAULT_TICKET_PRICE,
            duration_ms: DAILY_DRAW_DURATION_MS,
            sweep_interval: Duration::from_secs(60),
            create_interval: Duration::from_millis(DAILY_DRAW_DURATION_MS),
        }
    }
}

/// Load the agent's signing keypair from the file named by `AGENT_KEYPAIR`
pub fn agent_keypair_from_env() -> Result<Keypair, ConfigError> {
    let path = env::var(ENV_AGENT_KEYPAIR).map_err(|_| ConfigError::MissingVar(ENV_AGENT_KEYPAIR))?;
    read_keypair_file(&path).map_err(|e| ConfigError::Keypair {
        path,
        reason: e.to_string(),
    })
}

fn required<T: FromStr>(name: &'static str) -> Result<T, ConfigError> {
    optional(name)?.ok_or(ConfigError::MissingVar(name))
}

fn optional<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { name, value }),
        Err(_) => Ok(None),
    }
}
