use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ledger::{resolve_phase, Phase},
    model::{common::election::ElectionStatus, mongodb::Id},
};

/// Reasons an election definition can be refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidElection {
    #[error("Election title must not be empty")]
    EmptyTitle,
    #[error("Election must start before it ends ({start} is not before {end})")]
    EmptyWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// An election, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Voting opens at this instant (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,
    /// Voting closes after this instant; the instant itself is still open.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,
    /// Administrator-set status. Advisory; see [`Election::phase_at`].
    pub status: ElectionStatus,
}

impl Election {
    /// Create a new pending election with a fresh ID.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, InvalidElection> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(InvalidElection::EmptyTitle);
        }
        if start_time >= end_time {
            return Err(InvalidElection::EmptyWindow {
                start: start_time,
                end: end_time,
            });
        }

        Ok(Self {
            id: Id::new(),
            title,
            description,
            start_time,
            end_time,
            status: ElectionStatus::Pending,
        })
    }

    /// The effective phase of this election at the given instant.
    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        resolve_phase(self.status, self.start_time, self.end_time, now)
    }
}
