use fw_registry::RegistryError;
use fw_rules::IngestError;
use std::fmt;

/// Everything that can go wrong between a wire snapshot arriving and a risk
/// state coming out. None of these are retried here; retry policy belongs to
/// the ingestion collaborator.
#[derive(Debug)]
pub enum TrackerError {
    /// The snapshot failed structural validation; the account's last risk
    /// state stands.
    InvalidSnapshot { field: &'static str, reason: String },
    /// Timestamp not after the last accepted snapshot.
    OutOfOrder(IngestError),
    /// No rule set matched the account's (firm, account_type, version).
    RuleSetNotFound(RegistryError),
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSnapshot { field, reason } => {
                write!(f, "invalid snapshot: {field}: {reason}")
            }
            Self::OutOfOrder(err) => write!(f, "out of order: {err}"),
            Self::RuleSetNotFound(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSnapshot { .. } => None,
            Self::OutOfOrder(err) => Some(err),
            Self::RuleSetNotFound(err) => Some(err),
        }
    }
}

impl From<IngestError> for TrackerError {
    fn from(err: IngestError) -> Self {
        Self::OutOfOrder(err)
    }
}

impl From<RegistryError> for TrackerError {
    fn from(err: RegistryError) -> Self {
        Self::RuleSetNotFound(err)
    }
}
