//! Wire-to-engine snapshot validation.
//!
//! Rejection is all-or-nothing: one bad field fails the whole snapshot and
//! the account's previous risk state stands (stale-but-valid beats corrupt).

use crate::error::TrackerError;
use chrono::NaiveDate;
use fw_rules::snapshot::{AccountSnapshot, Position};
use fw_rules::Micros;
use std::collections::BTreeMap;

fn money(field: &'static str, raw: &str) -> Result<Micros, TrackerError> {
    Micros::parse_str(raw).map_err(|err| TrackerError::InvalidSnapshot {
        field,
        reason: format!("{err} (got {raw:?})"),
    })
}

pub fn parse_snapshot(wire: &fw_schemas::AccountSnapshot) -> Result<AccountSnapshot, TrackerError> {
    if wire.account_id.is_empty() {
        return Err(TrackerError::InvalidSnapshot {
            field: "account_id",
            reason: "must be non-empty".to_string(),
        });
    }
    let ts_utc = wire.timestamp.to_utc().ok_or_else(|| TrackerError::InvalidSnapshot {
        field: "timestamp",
        reason: format!("unresolvable timestamp {:?}", wire.timestamp),
    })?;

    let equity = money("equity", &wire.equity)?;
    let balance = money("balance", &wire.balance)?;
    let realized_pnl = money("realized_pnl", &wire.realized_pnl)?;
    let unrealized_pnl = money("unrealized_pnl", &wire.unrealized_pnl)?;
    let starting_balance = money("starting_balance", &wire.starting_balance)?;
    if starting_balance <= Micros::ZERO {
        return Err(TrackerError::InvalidSnapshot {
            field: "starting_balance",
            reason: format!("must be positive, got {starting_balance}"),
        });
    }

    let mut positions = Vec::with_capacity(wire.positions.len());
    for pos in &wire.positions {
        if pos.quantity == 0 {
            return Err(TrackerError::InvalidSnapshot {
                field: "positions.quantity",
                reason: format!("open position {} has zero quantity", pos.symbol),
            });
        }
        let opened_at = pos.opened_at.to_utc().ok_or_else(|| TrackerError::InvalidSnapshot {
            field: "positions.opened_at",
            reason: format!("unresolvable timestamp {:?}", pos.opened_at),
        })?;
        let peak = match &pos.peak_unrealized_loss {
            Some(raw) => money("positions.peak_unrealized_loss", raw)?,
            None => Micros::ZERO,
        };
        positions.push(Position {
            symbol: pos.symbol.clone(),
            quantity: pos.quantity,
            avg_price: money("positions.avg_price", &pos.avg_price)?,
            current_price: money("positions.current_price", &pos.current_price)?,
            unrealized_pnl: money("positions.unrealized_pnl", &pos.unrealized_pnl)?,
            opened_at,
            // Hints claiming a profit are clamped; an excursion is a loss.
            peak_unrealized_loss: peak.min(Micros::ZERO),
        });
    }

    let mut daily_pnl_hint = BTreeMap::new();
    for (date_raw, pnl_raw) in &wire.daily_pnl_by_date {
        let date: NaiveDate = date_raw.parse().map_err(|_| TrackerError::InvalidSnapshot {
            field: "daily_pnl_by_date",
            reason: format!("bad date key {date_raw:?}"),
        })?;
        daily_pnl_hint.insert(date, money("daily_pnl_by_date", pnl_raw)?);
    }

    Ok(AccountSnapshot {
        account_id: wire.account_id.clone(),
        ts_utc,
        equity,
        balance,
        realized_pnl,
        unrealized_pnl,
        starting_balance,
        positions,
        daily_pnl_hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fw_schemas::WireTimestamp;

    fn wire() -> fw_schemas::AccountSnapshot {
        fw_schemas::AccountSnapshot {
            account_id: "acct-1".to_string(),
            timestamp: WireTimestamp::Rfc3339("2024-01-02T12:00:00Z".to_string()),
            equity: "49950.25".to_string(),
            balance: "50000.00".to_string(),
            realized_pnl: "-49.75".to_string(),
            unrealized_pnl: "0.00".to_string(),
            starting_balance: "50000.00".to_string(),
            positions: Vec::new(),
            daily_pnl_by_date: BTreeMap::new(),
        }
    }

    #[test]
    fn well_formed_snapshot_parses() {
        let snap = parse_snapshot(&wire()).unwrap();
        assert_eq!(snap.equity, Micros::parse_str("49950.25").unwrap());
        assert_eq!(
            snap.ts_utc,
            "2024-01-02T12:00:00Z"
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap()
        );
    }

    #[test]
    fn malformed_money_field_names_the_field() {
        let mut w = wire();
        w.equity = "fifty grand".to_string();
        let err = parse_snapshot(&w).unwrap_err();
        match err {
            TrackerError::InvalidSnapshot { field, .. } => assert_eq!(field, "equity"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn epoch_millis_timestamp_is_accepted() {
        let mut w = wire();
        w.timestamp = WireTimestamp::EpochMillis(1_704_196_800_000);
        let snap = parse_snapshot(&w).unwrap();
        assert_eq!(
            snap.ts_utc,
            "2024-01-02T12:00:00Z"
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap()
        );
    }

    #[test]
    fn zero_quantity_position_is_rejected() {
        let mut w = wire();
        w.positions.push(fw_schemas::PositionSnapshot {
            symbol: "ES".to_string(),
            quantity: 0,
            avg_price: "4800.00".to_string(),
            current_price: "4800.00".to_string(),
            unrealized_pnl: "0.00".to_string(),
            opened_at: WireTimestamp::EpochMillis(1_704_196_800_000),
            peak_unrealized_loss: None,
        });
        assert!(parse_snapshot(&w).is_err());
    }

    #[test]
    fn positive_peak_loss_hint_is_clamped_to_zero() {
        let mut w = wire();
        w.positions.push(fw_schemas::PositionSnapshot {
            symbol: "ES".to_string(),
            quantity: 1,
            avg_price: "4800.00".to_string(),
            current_price: "4800.00".to_string(),
            unrealized_pnl: "25.00".to_string(),
            opened_at: WireTimestamp::EpochMillis(1_704_196_800_000),
            peak_unrealized_loss: Some("12.00".to_string()),
        });
        let snap = parse_snapshot(&w).unwrap();
        assert_eq!(snap.positions[0].peak_unrealized_loss, Micros::ZERO);
    }

    #[test]
    fn bad_hint_date_key_is_rejected() {
        let mut w = wire();
        w.daily_pnl_by_date.insert("Jan 2".to_string(), "-100.00".to_string());
        assert!(parse_snapshot(&w).is_err());
    }
}
