use solana_program::pubkey::Pubkey;

use luckydraw::{
    state::DurationPreset,
    utils::{format_coins, parse_coins, payout_preview, short_address},
    ValidationError,
};

#[test]
fn test_parse_coins() {
    assert_eq!(parse_coins("0.1"), Ok(100_000_000));
    assert_eq!(parse_coins("1"), Ok(1_000_000_000));
    assert_eq!(parse_coins(" 2.5 "), Ok(2_500_000_000));
    assert_eq!(parse_coins(".000000001"), Ok(1));
    assert_eq!(parse_coins("3."), Ok(3_000_000_000));

    for bad in ["", ".", "abc", "-1", "1.2.3", "0.0000000001", "99999999999999999999"] {
        assert_eq!(
            parse_coins(bad),
            Err(ValidationError::InvalidAmount(bad.to_string())),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_format_coins() {
    assert_eq!(format_coins(100_000_000), "0.1");
    assert_eq!(format_coins(1_000_000_000), "1");
    assert_eq!(format_coins(1_250_000_000), "1.25");
    assert_eq!(format_coins(1), "0.000000001");
    assert_eq!(format_coins(0), "0");
}

#[test]
fn test_short_address() {
    let address = Pubkey::new_unique();
    let full = address.to_string();
    let short = short_address(&address);

    assert!(short.starts_with(&full[..6]));
    assert!(short.ends_with(&full[full.len() - 4..]));
    assert_eq!(short.len(), 13);
}

#[test]
fn test_payout_preview() {
    let preview = payout_preview(300_000_000);
    assert_eq!(preview.keeper_incentive, 3_000_000);
    assert_eq!(preview.winner_prize, 297_000_000);

    let tiny = payout_preview(99);
    assert_eq!(tiny.keeper_incentive, 0);
    assert_eq!(tiny.winner_prize, 99);
}

#[test]
fn test_duration_presets() {
    assert_eq!(DurationPreset::try_from(1).unwrap().as_millis(), 60_000);
    assert_eq!(DurationPreset::try_from(10080).unwrap().label(), "7 days");
    assert_eq!(DurationPreset::try_from(1440), Ok(DurationPreset::OneDay));
    assert_eq!(
        DurationPreset::try_from(7),
        Err(ValidationError::UnknownDuration(7))
    );
    assert_eq!(DurationPreset::ALL.len(), 8);
    for preset in DurationPreset::ALL {
        assert_eq!(DurationPreset::try_from(preset.minutes()), Ok(preset));
    }
}
