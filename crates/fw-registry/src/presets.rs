//! Builtin rule sets for the supported firms, sized for $50k accounts.
//!
//! These mirror each firm's published rules closely enough for advisory
//! monitoring; they are not a substitute for the firm's own back-office
//! calculation. External configuration loaded at runtime overrides these.

use chrono::NaiveDate;
use fw_rules::config::{
    ConsistencyConfig, DailyLossLimitConfig, RuleSetConfig, TradingHoursConfig,
    TrailingDrawdownConfig,
};
use fw_rules::{Micros, Pct};

const VERSION: &str = "1.0";

fn effective() -> NaiveDate {
    // Preset generation date; bump when a firm changes published rules.
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn base(firm: &str, account_type: &str) -> RuleSetConfig {
    RuleSetConfig {
        firm: firm.to_string(),
        account_type: account_type.to_string(),
        version: VERSION.to_string(),
        effective_date: effective(),
        trailing_drawdown: None,
        daily_loss_limit: None,
        overall_max_loss: None,
        max_position_size: None,
        trading_hours: None,
        consistency: None,
    }
}

fn trailing(percent: i64, intraday: bool) -> TrailingDrawdownConfig {
    TrailingDrawdownConfig {
        enabled: true,
        max_drawdown_percent: Pct::from_whole(percent),
        include_unrealized_pnl: intraday,
        reset_on_profit_target: false,
        profit_target_percent: None,
    }
}

fn forced_close(time: &str, timezone: &str) -> TradingHoursConfig {
    TradingHoursConfig {
        enabled: true,
        allowed_windows: Vec::new(),
        timezone: timezone.to_string(),
        forced_close_time: Some(time.to_string()),
        warning_margin_minutes: 15,
    }
}

fn consistency(cap: i64, min_days: Option<u32>) -> ConsistencyConfig {
    ConsistencyConfig {
        enabled: true,
        max_daily_profit_percent: Pct::from_whole(cap),
        min_trades_per_day: min_days,
    }
}

/// Apex Trader Funding: 5% intraday trailing drawdown, flat by 16:59 ET, no
/// daily loss limit. PA accounts add the 30% consistency check.
fn apex(account_type: &str) -> RuleSetConfig {
    let mut cfg = base("apex", account_type);
    cfg.trailing_drawdown = Some(trailing(5, true));
    cfg.trading_hours = Some(forced_close("16:59", "America/New_York"));
    if account_type == "pa" {
        cfg.consistency = Some(consistency(30, None));
    }
    cfg
}

/// Topstep: 4% end-of-day drawdown (balance basis), $1,000 DLL on a $50k
/// combine, flat by 15:10 CT. Evals add the 50% consistency check.
fn topstep(account_type: &str) -> RuleSetConfig {
    let mut cfg = base("topstep", account_type);
    cfg.trailing_drawdown = Some(trailing(4, false));
    cfg.daily_loss_limit = Some(DailyLossLimitConfig {
        enabled: true,
        max_loss: Micros::from_whole(1_000),
        reset_time: "16:00".to_string(),
        timezone: "America/Chicago".to_string(),
    });
    cfg.trading_hours = Some(forced_close("15:10", "America/Chicago"));
    if account_type == "eval" {
        cfg.consistency = Some(consistency(50, Some(2)));
    }
    cfg
}

/// My Funded Futures: 5% intraday trailing drawdown; funded accounts add a
/// $2,500 daily loss limit and the 40% consistency check.
fn mff(account_type: &str) -> RuleSetConfig {
    let mut cfg = base("mff", account_type);
    cfg.trailing_drawdown = Some(trailing(5, true));
    if account_type == "funded" {
        cfg.daily_loss_limit = Some(DailyLossLimitConfig {
            enabled: true,
            max_loss: Micros::from_whole(2_500),
            reset_time: "17:00".to_string(),
            timezone: "America/Chicago".to_string(),
        });
        cfg.consistency = Some(consistency(40, Some(5)));
    }
    cfg
}

/// Bulenox: 5% intraday trailing drawdown, no minimum-day gate on evals;
/// funded accounts add a $2,000 daily loss limit and the 40% consistency
/// check.
fn bulenox(account_type: &str) -> RuleSetConfig {
    let mut cfg = base("bulenox", account_type);
    cfg.trailing_drawdown = Some(trailing(5, true));
    if account_type == "funded" {
        cfg.daily_loss_limit = Some(DailyLossLimitConfig {
            enabled: true,
            max_loss: Micros::from_whole(2_000),
            reset_time: "17:00".to_string(),
            timezone: "America/Chicago".to_string(),
        });
        cfg.consistency = Some(consistency(40, None));
    }
    cfg
}

/// TakeProfitTrader: 5% end-of-day drawdown and a 16:00 CT close on the
/// test; funded accounts switch to intraday trailing with a 50% consistency
/// review.
fn takeprofit(account_type: &str) -> RuleSetConfig {
    let mut cfg = base("takeprofit", account_type);
    if account_type == "eval" {
        cfg.trailing_drawdown = Some(trailing(5, false));
        cfg.trading_hours = Some(forced_close("16:00", "America/Chicago"));
    } else {
        cfg.trailing_drawdown = Some(trailing(5, true));
        cfg.consistency = Some(consistency(50, None));
    }
    cfg
}

/// Every builtin preset.
pub fn all() -> Vec<RuleSetConfig> {
    vec![
        apex("eval"),
        apex("pa"),
        topstep("eval"),
        topstep("funded"),
        mff("eval"),
        mff("funded"),
        bulenox("eval"),
        bulenox("funded"),
        takeprofit("eval"),
        takeprofit("funded"),
    ]
}
