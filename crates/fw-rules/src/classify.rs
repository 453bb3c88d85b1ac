//! Severity and recoverability classification.
//!
//! Pure lookups from (rule, status). Terminal rules are the ones whose
//! violation ends the account outright; their caution tier already warrants a
//! medium severity.

use crate::types::{Recoverability, RuleKind, RuleStatus, Severity};

/// A violation of these rules cannot be traded back from.
pub fn is_terminal(kind: RuleKind) -> bool {
    matches!(kind, RuleKind::TrailingDrawdown | RuleKind::OverallMaxLoss)
}

pub fn severity_for(kind: RuleKind, status: RuleStatus) -> Severity {
    match status {
        RuleStatus::Safe => Severity::None,
        RuleStatus::Caution => {
            if is_terminal(kind) {
                Severity::Medium
            } else {
                Severity::Low
            }
        }
        RuleStatus::Critical => Severity::High,
        RuleStatus::Violated => Severity::Critical,
    }
}

pub fn recoverability_for(kind: RuleKind, status: RuleStatus) -> Recoverability {
    if status != RuleStatus::Violated {
        return Recoverability::Recoverable;
    }
    match kind {
        RuleKind::TrailingDrawdown | RuleKind::OverallMaxLoss => Recoverability::NonRecoverable,
        // Lifts at the next daily reset.
        RuleKind::DailyLossLimit => Recoverability::Conditional,
        // Lifts once the next allowed window opens.
        RuleKind::TradingHours => Recoverability::Conditional,
        // A day's profit cannot be un-earned; the ratio dilutes as later
        // profitable days accumulate.
        RuleKind::Consistency => Recoverability::Conditional,
        // Fixable immediately by reducing size.
        RuleKind::MaxPositionSize => Recoverability::Recoverable,
    }
}
