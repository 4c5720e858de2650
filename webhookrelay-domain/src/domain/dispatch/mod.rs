use crate::RelayError;
use strum::AsRefStr;

/// Terminal result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchOutcome {
    /// The relay is disabled or has no URL; nothing was sent.
    Skipped,
    /// The payload could not be built, so no request was made.
    BuildFailed(RelayError),
    Delivered {
        url: String,
    },
    RemoteRejected {
        status: u16,
        body: String,
        reason: Option<String>,
    },
    /// The transport produced no response at all.
    TransportFailed,
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DispatchOutcome::Skipped)
    }
}
