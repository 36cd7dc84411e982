use solana_program::pubkey::Pubkey;
use std::env;
use std::time::Duration;

use luckydraw::{
    config::{
        agent_keypair_from_env, ClientConfig, KeeperConfig, ENV_AGENT_KEYPAIR, ENV_POLL_INTERVAL_MS,
        ENV_PROGRAM_ID, ENV_RECONCILE_ATTEMPTS, ENV_RECONCILE_INTERVAL_MS,
    },
    error::ConfigError,
    RetryPolicy,
};

// Environment is process-wide, so every case runs in one test
#[test]
fn test_config_from_env() {
    for name in [
        ENV_PROGRAM_ID,
        ENV_POLL_INTERVAL_MS,
        ENV_RECONCILE_ATTEMPTS,
        ENV_RECONCILE_INTERVAL_MS,
        ENV_AGENT_KEYPAIR,
    ] {
        env::remove_var(name);
    }

    assert!(matches!(
        ClientConfig::from_env(),
        Err(ConfigError::MissingVar(ENV_PROGRAM_ID))
    ));

    env::set_var(ENV_PROGRAM_ID, "not-a-pubkey");
    assert!(matches!(
        ClientConfig::from_env(),
        Err(ConfigError::InvalidVar { name: ENV_PROGRAM_ID, .. })
    ));

    let program_id = Pubkey::new_unique();
    env::set_var(ENV_PROGRAM_ID, program_id.to_string());
    let config = ClientConfig::from_env().unwrap();
    assert_eq!(config, ClientConfig::new(program_id));
    assert_eq!(config.poll_interval, Duration::from_secs(5));
    assert_eq!(config.registry_interval, Duration::from_secs(10));
    assert_eq!(config.countdown_tick, Duration::from_secs(1));
    assert_eq!(config.reconcile, RetryPolicy::new(4, 2_000));

    env::set_var(ENV_POLL_INTERVAL_MS, "2500");
    env::set_var(ENV_RECONCILE_ATTEMPTS, "7");
    env::set_var(ENV_RECONCILE_INTERVAL_MS, "500");
    let config = ClientConfig::from_env().unwrap();
    assert_eq!(config.poll_interval, Duration::from_millis(2_500));
    assert_eq!(config.reconcile, RetryPolicy::new(7, 500));

    env::set_var(ENV_RECONCILE_ATTEMPTS, "many");
    assert!(ClientConfig::from_env().is_err());

    assert!(matches!(
        agent_keypair_from_env(),
        Err(ConfigError::MissingVar(ENV_AGENT_KEYPAIR))
    ));
    env::set_var(ENV_AGENT_KEYPAIR, "/nonexistent/agent.json");
    assert!(matches!(
        agent_keypair_from_env(),
        Err(ConfigError::Keypair { .. })
    ));
}

#[test]
fn test_keeper_defaults() {
    let config = KeeperConfig::default();
    assert_eq!(config.ticket_price, 100_000_000);
    assert_eq!(config.duration_ms, 86_400_000);
    assert_eq!(config.sweep_interval, Duration::from_secs(60));
}
