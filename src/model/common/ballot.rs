use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// A voter's selection, as submitted.
///
/// The ledger never interprets the contents; it only guarantees that at most one payload
/// is ever recorded per voter per election.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallotPayload(pub Document);

impl BallotPayload {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use mongodb::bson::doc;

    use super::*;

    impl BallotPayload {
        pub fn example() -> Self {
            Self(doc! { "candidate": "Chris Riches" })
        }

        pub fn example2() -> Self {
            Self(doc! { "candidate": "Parry Hotter" })
        }
    }
}
