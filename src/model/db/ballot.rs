use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::ballot::BallotPayload, mongodb::Id};

/// A ballot that has been committed to the ledger.
///
/// Written in the same atomic unit as the voter's eligibility flag flip, so a recorded
/// ballot exists if and only if the matching [`super::EligibilityRecord`] has voted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedBallot {
    pub voter_id: Id,
    pub election_id: Id,
    pub payload: BallotPayload,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl RecordedBallot {
    pub fn new(voter_id: Id, election_id: Id, payload: BallotPayload, cast_at: DateTime<Utc>) -> Self {
        Self {
            voter_id,
            election_id,
            payload,
            cast_at,
        }
    }
}
