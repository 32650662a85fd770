use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// Why a vote was not, or would not be, accepted.
///
/// These are ordinary outcomes rather than failures, and retrying them is pointless.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// The election does not exist or the voter is not on its electorate.
    NotEligible,
    NotYetOpen,
    AlreadyClosed,
    AlreadyVoted,
}

impl Display for Rejection {
    /// A message safe to show the voter.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::NotEligible => "You are not eligible to vote in this election",
            Self::NotYetOpen => "Voting has not yet opened for this election",
            Self::AlreadyClosed => "Voting has closed for this election",
            Self::AlreadyVoted => "You have already voted in this election",
        };
        f.write_str(msg)
    }
}

/// The gate's verdict on a prospective vote.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eligibility {
    Permit,
    Deny(Rejection),
}

impl Eligibility {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Self::Permit)
    }
}

/// Decide whether a vote should even be attempted.
///
/// This only sees a snapshot of `has_voted` and is not a guard against concurrent
/// submissions; [`super::Ledger::commit_vote`] is. A recorded vote takes precedence over
/// the phase, so a voter who has voted is told so whether or not the election is still open.
pub fn can_vote(phase: Phase, has_voted: bool) -> Eligibility {
    if has_voted {
        return Eligibility::Deny(Rejection::AlreadyVoted);
    }
    match phase {
        Phase::Upcoming => Eligibility::Deny(Rejection::NotYetOpen),
        Phase::Closed => Eligibility::Deny(Rejection::AlreadyClosed),
        Phase::Active => Eligibility::Permit,
    }
}
