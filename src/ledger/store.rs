use mongodb::error::Error as DbError;
use thiserror::Error;

use crate::model::{
    db::{Election, EligibilityRecord, RecordedBallot},
    mongodb::Id,
};

/// A failure of the underlying storage.
///
/// Never a partial success: a write is applied whole or not at all. Usually an error
/// means nothing was written. The exception is a commit whose outcome the database could
/// not report even after reading the ballot back; it may have landed. Callers may retry
/// either way, since a retry after a landed commit is answered with `AlreadyVoted` and
/// never records a second ballot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Transaction abandoned after {0} conflicting attempts")]
    TooManyAttempts(usize),
}

/// Outcome of granting a voter eligibility for an election.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Grant {
    Granted,
    /// The voter already had a record; it was left untouched.
    AlreadyEligible,
    UnknownElection,
}

/// Persistent storage for elections, eligibility, and recorded ballots.
#[rocket::async_trait]
pub trait RecordStore: Send + Sync {
    async fn read_election(&self, election_id: Id) -> Result<Option<Election>, StoreError>;

    async fn read_eligibility(
        &self,
        voter_id: Id,
        election_id: Id,
    ) -> Result<Option<EligibilityRecord>, StoreError>;

    /// Every election the voter holds a record for, paired with that record.
    /// No particular order.
    async fn eligibility_for_voter(
        &self,
        voter_id: Id,
    ) -> Result<Vec<(Election, EligibilityRecord)>, StoreError>;

    /// Atomically mark the ballot's voter as having voted in its election and store the
    /// ballot, but only if they have not voted yet.
    ///
    /// Returns the number of eligibility records changed: 1 if the ballot was recorded, 0 if
    /// the voter had already voted or holds no record. Concurrent calls for the same voter
    /// and election must never both return 1, and the flag is never set without the ballot
    /// (or vice versa).
    async fn conditional_mark_voted(&self, ballot: &RecordedBallot) -> Result<u64, StoreError>;

    async fn insert_election(&self, election: &Election) -> Result<(), StoreError>;

    /// Give the voter a not-yet-voted record for the election, unless they already have one.
    async fn grant_eligibility(&self, voter_id: Id, election_id: Id) -> Result<Grant, StoreError>;
}
