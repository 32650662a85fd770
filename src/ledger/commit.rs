use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, error, info};

use crate::model::{
    common::ballot::BallotPayload,
    db::{Election, RecordedBallot},
    mongodb::Id,
};

use super::{
    clock::Clock,
    gate::{can_vote, Eligibility, Rejection},
    phase::Phase,
    store::{RecordStore, StoreError},
};

/// Result of an attempt to record a ballot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { committed_at: DateTime<Utc> },
    Rejected(Rejection),
}

/// An election as seen by one voter, for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleElection {
    pub election: Election,
    pub phase: Phase,
    pub has_voted: bool,
    pub eligibility: Eligibility,
}

/// The voting ledger: eligibility checks and at-most-once vote commits over a record store.
///
/// Every operation takes the voter's identity explicitly; nothing here authenticates.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The effective phase of the election right now.
    pub fn phase_of(&self, election: &Election) -> Phase {
        election.phase_at(self.clock.now())
    }

    /// Run the eligibility gate against a fresh snapshot of the election and the voter's
    /// record. Advisory: the answer may be stale by the time a vote is submitted.
    pub async fn check(&self, voter_id: Id, election_id: Id) -> Result<Eligibility, StoreError> {
        let election = match self.store.read_election(election_id).await? {
            Some(election) => election,
            None => return Ok(Eligibility::Deny(Rejection::NotEligible)),
        };
        let record = match self.store.read_eligibility(voter_id, election_id).await? {
            Some(record) => record,
            None => return Ok(Eligibility::Deny(Rejection::NotEligible)),
        };
        Ok(can_vote(self.phase_of(&election), record.has_voted))
    }

    /// All elections the voter is eligible for, newest start first, with their current
    /// phase and the gate's verdict.
    pub async fn eligible_elections(
        &self,
        voter_id: Id,
    ) -> Result<Vec<EligibleElection>, StoreError> {
        let now = self.clock.now();
        let mut elections: Vec<_> = self
            .store
            .eligibility_for_voter(voter_id)
            .await?
            .into_iter()
            .map(|(election, record)| {
                let phase = election.phase_at(now);
                EligibleElection {
                    eligibility: can_vote(phase, record.has_voted),
                    has_voted: record.has_voted,
                    phase,
                    election,
                }
            })
            .collect();
        // Ties broken by ID so the order is stable across stores.
        elections.sort_by(|a, b| {
            b.election
                .start_time
                .cmp(&a.election.start_time)
                .then_with(|| b.election.id.cmp(&a.election.id))
        });
        Ok(elections)
    }

    /// A single election as seen by the voter, or `None` if they are not eligible for it.
    pub async fn eligible_election(
        &self,
        voter_id: Id,
        election_id: Id,
    ) -> Result<Option<EligibleElection>, StoreError> {
        let election = match self.store.read_election(election_id).await? {
            Some(election) => election,
            None => return Ok(None),
        };
        let record = match self.store.read_eligibility(voter_id, election_id).await? {
            Some(record) => record,
            None => return Ok(None),
        };
        let phase = self.phase_of(&election);
        Ok(Some(EligibleElection {
            eligibility: can_vote(phase, record.has_voted),
            has_voted: record.has_voted,
            phase,
            election,
        }))
    }

    /// Record the voter's ballot for the election, at most once.
    ///
    /// The phase is resolved again from a fresh read, and the record is only changed through
    /// the store's atomic conditional update, so any number of concurrent calls for the same
    /// voter and election produce exactly one `Committed`. An `Err` may always be retried;
    /// see [`StoreError`] for the one case where the write could nonetheless have landed.
    pub async fn commit_vote(
        &self,
        voter_id: Id,
        election_id: Id,
        ballot: BallotPayload,
    ) -> Result<CommitOutcome, StoreError> {
        let election = match self.store.read_election(election_id).await? {
            Some(election) => election,
            None => {
                debug!("Vote by {voter_id} for unknown election {election_id}");
                return Ok(CommitOutcome::Rejected(Rejection::NotEligible));
            }
        };

        let now = self.clock.now();
        match election.phase_at(now) {
            Phase::Active => {}
            Phase::Upcoming => {
                debug!("Vote by {voter_id} for election {election_id} before it opened");
                return Ok(CommitOutcome::Rejected(Rejection::NotYetOpen));
            }
            Phase::Closed => {
                debug!("Vote by {voter_id} for election {election_id} after it closed");
                return Ok(CommitOutcome::Rejected(Rejection::AlreadyClosed));
            }
        }

        let ballot = RecordedBallot::new(voter_id, election_id, ballot, now);
        let affected = self
            .store
            .conditional_mark_voted(&ballot)
            .await
            .map_err(|e| {
                error!("Failed to commit vote by {voter_id} for election {election_id}: {e}");
                e
            })?;

        match affected {
            1 => {
                info!("Committed vote by {voter_id} for election {election_id}");
                Ok(CommitOutcome::Committed { committed_at: now })
            }
            0 => {
                // Nothing changed, so this read is only used to explain why.
                let reason = match self.store.read_eligibility(voter_id, election_id).await? {
                    Some(record) if record.has_voted => Rejection::AlreadyVoted,
                    _ => Rejection::NotEligible,
                };
                info!("Vote by {voter_id} for election {election_id} not recorded: {reason:?}");
                Ok(CommitOutcome::Rejected(reason))
            }
            n => {
                error!("Vote by {voter_id} for election {election_id} changed {n} records");
                Err(StoreError::Unavailable(format!(
                    "conditional update changed {n} records"
                )))
            }
        }
    }

    /// The full voting flow: a cheap gate check first, then the authoritative commit.
    pub async fn cast_vote(
        &self,
        voter_id: Id,
        election_id: Id,
        ballot: BallotPayload,
    ) -> Result<CommitOutcome, StoreError> {
        match self.check(voter_id, election_id).await? {
            Eligibility::Permit => self.commit_vote(voter_id, election_id, ballot).await,
            Eligibility::Deny(reason) => {
                debug!("Gate turned away vote by {voter_id} for election {election_id}: {reason:?}");
                Ok(CommitOutcome::Rejected(reason))
            }
        }
    }
}
