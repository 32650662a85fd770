use serde::{Deserialize, Serialize};

/// The administrator-set status of an election.
///
/// This is advisory only: whether voting is actually open is always recomputed from the
/// election's time window, see [`crate::ledger::resolve_phase`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionStatus {
    /// Not yet opened by an administrator.
    Pending,
    /// Opened for voting.
    Active,
    /// Closed by an administrator; no further votes regardless of time.
    Closed,
}

impl ElectionStatus {
    pub const ALL: [ElectionStatus; 3] = [Self::Pending, Self::Active, Self::Closed];
}
