//! Trading hours: allowed windows plus an optional forced-close deadline.
//!
//! The only rule whose distance is time, not money. Being outside every
//! allowed window is a violation only while a position is open; a flat
//! account merely gets a warning.

use crate::calendar::{parse_hhmm, SessionClock};
use crate::classify::{recoverability_for, severity_for};
use crate::config::{TradingHoursConfig, TradingWindow};
use crate::fixedpoint::{Micros, Pct};
use crate::snapshot::AccountSnapshot;
use crate::types::{DistanceToViolation, RuleKind, RuleOutcome, RuleResult, RuleStatus};
use chrono::{Datelike, NaiveTime, Timelike};

const DAY_SECONDS: i64 = 86_400;

struct ParsedWindow<'a> {
    window: &'a TradingWindow,
    start: NaiveTime,
    end: NaiveTime,
}

pub fn evaluate(snap: &AccountSnapshot, cfg: &TradingHoursConfig) -> RuleOutcome {
    let clock = match SessionClock::new(&cfg.timezone, "00:00") {
        Ok(clock) => clock,
        Err(err) => {
            return RuleOutcome::Unavailable { reason: format!("trading hours config: {err}") }
        }
    };
    let forced_close = match cfg.forced_close_time.as_deref().map(parse_hhmm).transpose() {
        Ok(fc) => fc,
        Err(err) => {
            return RuleOutcome::Unavailable { reason: format!("trading hours config: {err}") }
        }
    };
    let mut windows = Vec::with_capacity(cfg.allowed_windows.len());
    for w in &cfg.allowed_windows {
        match (parse_hhmm(&w.start), parse_hhmm(&w.end)) {
            (Ok(start), Ok(end)) if start < end => {
                windows.push(ParsedWindow { window: w, start, end })
            }
            _ => {
                return RuleOutcome::Unavailable {
                    reason: format!("bad trading window {}..{}", w.start, w.end),
                }
            }
        }
    }

    let local = snap.ts_utc.with_timezone(&clock.timezone());
    let t = local.time();
    let weekday = local.weekday();
    let open = snap.has_open_positions();

    let active = windows
        .iter()
        .find(|w| w.window.days.iter().any(|d| d.matches(weekday)) && w.start <= t && t < w.end);

    // Outside every allowed window.
    if !windows.is_empty() && active.is_none() {
        return outside_windows(cfg, open);
    }

    let mut warnings = Vec::new();
    let mut violated = false;
    if let Some(fc) = forced_close {
        if t >= fc {
            if open {
                violated = true;
                warnings.push(format!(
                    "positions still open past the {} forced close",
                    cfg.forced_close_time.as_deref().unwrap_or("")
                ));
            } else {
                warnings.push("past the daily forced close time".to_string());
            }
        }
    }

    let span = active
        .map(|w| (w.end - w.start).num_seconds())
        .unwrap_or(DAY_SECONDS);
    let mut secs_left = match active {
        Some(w) => clock.seconds_until_local(snap.ts_utc, w.end),
        None => DAY_SECONDS - i64::from(t.num_seconds_from_midnight()),
    };
    if let Some(fc) = forced_close {
        if t < fc {
            secs_left = secs_left.min(clock.seconds_until_local(snap.ts_utc, fc));
        } else if violated {
            secs_left = 0;
        }
    }

    let pct = if violated {
        Pct::ZERO
    } else {
        Pct::from_ratio(Micros::from_whole(secs_left), Micros::from_whole(span))
    };
    let status = if violated {
        RuleStatus::Violated
    } else if secs_left <= 60 {
        RuleStatus::Critical
    } else if secs_left <= cfg.warning_margin_minutes * 60 {
        RuleStatus::Caution
    } else {
        RuleStatus::Safe
    };

    if status == RuleStatus::Caution || status == RuleStatus::Critical {
        warnings.insert(0, format!("trading window closes in {} min", secs_left / 60));
    }

    let recovery_path = match status {
        RuleStatus::Violated => Some("close all positions or wait for the next allowed window".to_string()),
        RuleStatus::Critical | RuleStatus::Caution => {
            Some("flatten before the window closes".to_string())
        }
        RuleStatus::Safe => None,
    };

    RuleOutcome::Evaluated(RuleResult {
        rule: RuleKind::TradingHours,
        current_value: Micros::from_whole(secs_left),
        threshold: Micros::from_whole(span),
        remaining_buffer: Micros::from_whole(secs_left),
        buffer_percent: pct,
        status,
        distance: DistanceToViolation::TimeRemaining { seconds: secs_left },
        warnings,
        recoverable: recoverability_for(RuleKind::TradingHours, status),
        severity: severity_for(RuleKind::TradingHours, status),
        recovery_path,
    })
}

fn outside_windows(cfg: &TradingHoursConfig, open: bool) -> RuleOutcome {
    let status = if open { RuleStatus::Violated } else { RuleStatus::Safe };
    let warnings = if open {
        vec!["position open outside allowed trading hours".to_string()]
    } else {
        vec!["outside allowed trading hours".to_string()]
    };
    let pct = if open { Pct::ZERO } else { Pct::HUNDRED };
    RuleOutcome::Evaluated(RuleResult {
        rule: RuleKind::TradingHours,
        current_value: Micros::ZERO,
        threshold: Micros::ZERO,
        remaining_buffer: Micros::ZERO,
        buffer_percent: pct,
        status,
        distance: DistanceToViolation::TimeRemaining { seconds: 0 },
        warnings,
        recoverable: recoverability_for(RuleKind::TradingHours, status),
        severity: severity_for(RuleKind::TradingHours, status),
        recovery_path: open
            .then(|| "close all positions or wait for the next allowed window".to_string()),
    })
}
