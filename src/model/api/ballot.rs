use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Acknowledgement that a ballot has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteConfirmation {
    pub election_id: Id,
    pub committed_at: DateTime<Utc>,
}
