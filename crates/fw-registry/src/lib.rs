//! fw-registry
//!
//! Versioned rule-set store. Rule sets are keyed by (firm, account type,
//! version), validated on insert, and immutable afterwards. Ships builtin
//! presets for the supported firms plus a JSON loader for external
//! configuration sources.

use anyhow::{Context, Result};
use fw_rules::calendar::{parse_hhmm, SessionClock};
use fw_rules::config::RuleSetConfig;
use fw_rules::{Micros, Pct};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub mod presets;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    RuleSetNotFound {
        firm: String,
        account_type: String,
        version: Option<String>,
    },
    Invalid {
        firm: String,
        account_type: String,
        version: String,
        reason: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleSetNotFound { firm, account_type, version } => match version {
                Some(v) => {
                    write!(f, "no rule set for firm={firm} account_type={account_type} version={v}")
                }
                None => write!(f, "no rule set for firm={firm} account_type={account_type}"),
            },
            Self::Invalid { firm, account_type, version, reason } => write!(
                f,
                "rule set {firm}/{account_type}/{version} rejected: {reason}"
            ),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Stable content hash of a rule set, for audit records and change detection.
pub fn rule_set_hash(cfg: &RuleSetConfig) -> String {
    let bytes = serde_json::to_vec(cfg).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// Structural validation beyond what serde enforces. Run on every insert so a
/// resolved rule set never hands the evaluators a nonsensical threshold.
pub fn validate(cfg: &RuleSetConfig) -> Result<(), String> {
    if cfg.firm.is_empty() || cfg.account_type.is_empty() || cfg.version.is_empty() {
        return Err("firm, account_type, and version must be non-empty".to_string());
    }
    if let Some(dd) = &cfg.trailing_drawdown {
        if dd.max_drawdown_percent <= Pct::ZERO || dd.max_drawdown_percent > Pct::HUNDRED {
            return Err("trailing_drawdown.max_drawdown_percent must be in (0, 100]".to_string());
        }
        if dd.reset_on_profit_target && dd.profit_target_percent.is_none() {
            return Err("reset_on_profit_target requires profit_target_percent".to_string());
        }
    }
    if let Some(dl) = &cfg.daily_loss_limit {
        if dl.max_loss <= Micros::ZERO {
            return Err("daily_loss_limit.max_loss must be positive".to_string());
        }
        SessionClock::new(&dl.timezone, &dl.reset_time).map_err(|e| e.to_string())?;
    }
    if let Some(ol) = &cfg.overall_max_loss {
        if ol.max_loss <= Micros::ZERO {
            return Err("overall_max_loss.max_loss must be positive".to_string());
        }
    }
    if let Some(ps) = &cfg.max_position_size {
        if ps.max_contracts <= 0 {
            return Err("max_position_size.max_contracts must be positive".to_string());
        }
    }
    if let Some(th) = &cfg.trading_hours {
        SessionClock::new(&th.timezone, "00:00").map_err(|e| e.to_string())?;
        if let Some(fc) = &th.forced_close_time {
            parse_hhmm(fc).map_err(|e| e.to_string())?;
        }
        for w in &th.allowed_windows {
            let start = parse_hhmm(&w.start).map_err(|e| e.to_string())?;
            let end = parse_hhmm(&w.end).map_err(|e| e.to_string())?;
            if start >= end {
                return Err(format!("trading window {}..{} is empty", w.start, w.end));
            }
            if w.days.is_empty() {
                return Err("trading window has no days".to_string());
            }
        }
    }
    if let Some(cr) = &cfg.consistency {
        if cr.max_daily_profit_percent <= Pct::ZERO || cr.max_daily_profit_percent > Pct::HUNDRED {
            return Err("consistency.max_daily_profit_percent must be in (0, 100]".to_string());
        }
    }
    Ok(())
}

#[derive(Default)]
pub struct RuleSetRegistry {
    sets: BTreeMap<(String, String, String), RuleSetConfig>,
}

impl RuleSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin firm presets.
    pub fn with_builtin_presets() -> Self {
        let mut reg = Self::new();
        for cfg in presets::all() {
            let inserted = reg.insert(cfg);
            debug_assert!(inserted.is_ok(), "builtin preset rejected: {inserted:?}");
        }
        reg
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn insert(&mut self, cfg: RuleSetConfig) -> Result<(), RegistryError> {
        validate(&cfg).map_err(|reason| RegistryError::Invalid {
            firm: cfg.firm.clone(),
            account_type: cfg.account_type.clone(),
            version: cfg.version.clone(),
            reason,
        })?;
        let key = (cfg.firm.clone(), cfg.account_type.clone(), cfg.version.clone());
        self.sets.insert(key, cfg);
        Ok(())
    }

    pub fn resolve(
        &self,
        firm: &str,
        account_type: &str,
        version: &str,
    ) -> Result<&RuleSetConfig, RegistryError> {
        self.sets
            .get(&(firm.to_string(), account_type.to_string(), version.to_string()))
            .ok_or_else(|| RegistryError::RuleSetNotFound {
                firm: firm.to_string(),
                account_type: account_type.to_string(),
                version: Some(version.to_string()),
            })
    }

    /// The newest rule set for a (firm, account type), by effective date then
    /// version.
    pub fn resolve_latest(
        &self,
        firm: &str,
        account_type: &str,
    ) -> Result<&RuleSetConfig, RegistryError> {
        self.sets
            .values()
            .filter(|c| c.firm == firm && c.account_type == account_type)
            .max_by(|a, b| {
                a.effective_date
                    .cmp(&b.effective_date)
                    .then_with(|| a.version.cmp(&b.version))
            })
            .ok_or_else(|| RegistryError::RuleSetNotFound {
                firm: firm.to_string(),
                account_type: account_type.to_string(),
                version: None,
            })
    }

    /// Load rule sets from a JSON file holding an array of rule set objects.
    /// All-or-nothing: one invalid entry fails the whole load and leaves the
    /// registry untouched.
    pub fn load_json_file(&mut self, path: &Path) -> Result<usize> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading rule sets from {}", path.display()))?;
        let configs: Vec<RuleSetConfig> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing rule sets from {}", path.display()))?;
        let count = configs.len();
        let mut staged = Self::new();
        for cfg in configs {
            staged
                .insert(cfg)
                .with_context(|| format!("loading rule sets from {}", path.display()))?;
        }
        self.sets.append(&mut staged.sets);
        Ok(count)
    }
}
