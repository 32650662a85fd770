use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::{optional_datetime, Id};

/// One voter's right to vote in one election, as stored in the database.
///
/// Unique per `(voter_id, election_id)`. `has_voted` starts false and is flipped exactly
/// once, by the commit protocol; nothing ever flips it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRecord {
    pub voter_id: Id,
    pub election_id: Id,
    pub has_voted: bool,
    /// When the vote was committed, if it has been.
    #[serde(default, with = "optional_datetime")]
    pub voted_at: Option<DateTime<Utc>>,
}

impl EligibilityRecord {
    /// A fresh record for a voter who has not voted yet.
    pub fn new(voter_id: Id, election_id: Id) -> Self {
        Self {
            voter_id,
            election_id,
            has_voted: false,
            voted_at: None,
        }
    }
}
