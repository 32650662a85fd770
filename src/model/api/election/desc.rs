use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ledger::{EligibleElection, Phase},
    model::{common::election::ElectionStatus, mongodb::Id},
};

/// An election as shown on a voter's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleElectionView {
    /// Election unique ID.
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Administrator-set status.
    pub status: ElectionStatus,
    /// Effective phase at the time of the request.
    pub phase: Phase,
    pub has_voted: bool,
    /// Whether to offer the voter a "cast vote" button.
    pub can_vote: bool,
    /// Why voting is unavailable, if it is.
    pub reason: Option<String>,
}

impl From<EligibleElection> for EligibleElectionView {
    fn from(eligible: EligibleElection) -> Self {
        use crate::ledger::Eligibility;

        let reason = match eligible.eligibility {
            Eligibility::Permit => None,
            Eligibility::Deny(rejection) => Some(rejection.to_string()),
        };
        Self {
            id: eligible.election.id,
            title: eligible.election.title,
            description: eligible.election.description,
            start_time: eligible.election.start_time,
            end_time: eligible.election.end_time,
            status: eligible.election.status,
            phase: eligible.phase,
            has_voted: eligible.has_voted,
            can_vote: eligible.eligibility.is_permitted(),
            reason,
        }
    }
}
