use momentumbot::config::{BotConfig, EquityMode, SideMode};
use momentumbot::{BotError, OrderSide, Timeframe};
use std::path::PathBuf;

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("momentumbot-{}-{}.toml", name, std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

// Environment variables are process-wide, so every load lives in one test
#[test]
fn test_layered_loading() {
    let path = write_config(
        "layered",
        r#"
            [broker]
            bridge_url = "http://10.0.0.5:8228"
            account = 2121944313
            server = "XBTFX-MetaTrader5"

            [trading]
            symbol = "ETHUSD!"
            timeframe = "m5"
            side_mode = "signal_directed"
            equity_mode = "per_cycle"

            [risk]
            price_threshold_pct = 2.5
            stop_loss_pct = 4.0
        "#,
    );

    let from_file = BotConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(from_file.broker.bridge_url, "http://10.0.0.5:8228");
    assert_eq!(from_file.broker.account, Some(2121944313));
    assert_eq!(from_file.trading.symbol, "ETHUSD!");
    assert_eq!(from_file.trading.timeframe, Timeframe::M5);
    assert_eq!(from_file.trading.side_mode, SideMode::SignalDirected);
    assert_eq!(from_file.trading.fixed_side, OrderSide::Buy);
    assert_eq!(from_file.trading.equity_mode, EquityMode::PerCycle);
    assert_eq!(from_file.risk.price_threshold_pct, 2.5);
    assert_eq!(from_file.risk.stop_loss_pct, 4.0);
    // Untouched values keep their defaults
    assert_eq!(from_file.risk.take_profit_pct, 8.0);
    assert_eq!(from_file.risk.cooldown_secs, 8);
    assert_eq!(from_file.risk.magic, 66);

    std::env::set_var("MOMENTUMBOT_RISK__STOP_LOSS_PCT", "6.5");
    std::env::set_var("MT5_PASSWORD", "from-env");

    let overridden = BotConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(overridden.risk.stop_loss_pct, 6.5);
    assert_eq!(overridden.broker.password.as_deref(), Some("from-env"));
    assert!(overridden.validate(true).is_ok());

    std::env::remove_var("MOMENTUMBOT_RISK__STOP_LOSS_PCT");
    std::env::remove_var("MT5_PASSWORD");
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_invalid_values_are_rejected() {
    let path = write_config(
        "invalid",
        r#"
            [risk]
            take_profit_pct = 150.0
        "#,
    );

    let config = BotConfig::load(Some(path.as_path())).unwrap();
    let _ = std::fs::remove_file(path);

    assert!(matches!(config.validate(false), Err(BotError::Config(msg)) if msg.contains("take_profit_pct")));
}

#[test]
fn test_unknown_timeframe_fails_to_load() {
    let path = write_config(
        "timeframe",
        r#"
            [trading]
            timeframe = "W1"
        "#,
    );

    let result = BotConfig::load(Some(path.as_path()));
    let _ = std::fs::remove_file(path);

    assert!(matches!(result, Err(BotError::Config(_))));
}
