use std::collections::HashMap;
use std::time::Duration as StdDuration;

use log::{trace, warn};
use mongodb::{
    bson::{doc, DateTime as BsonDateTime},
    error::{Error as DbError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::UpdateOptions,
    Client, ClientSession, Database,
};
use rocket::{futures::TryStreamExt, tokio::time::sleep};

use crate::{
    ledger::{Grant, RecordStore, StoreError},
    model::db::{Election, EligibilityRecord, RecordedBallot},
};

use super::{bson::Id, collection::Coll, errors::is_duplicate_key};

/// How many times a vote transaction is attempted before giving up.
/// Conflicts only arise between commits for the same voter and election, and the loser
/// of a conflict sees the vote already recorded on its next attempt.
pub const MAX_TRANSACTION_ATTEMPTS: usize = 5;

/// Pause before retrying a conflicted transaction, multiplied by the attempt number.
const TRANSACTION_BACKOFF_MILLIS: u64 = 10;

/// A record store backed by MongoDB.
///
/// The conditional vote transition runs in a multi-document transaction, so the server
/// must be a replica set or sharded cluster.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    elections: Coll<Election>,
    eligibility: Coll<EligibilityRecord>,
    ballots: Coll<RecordedBallot>,
}

impl MongoStore {
    pub fn new(client: Client, db: &Database) -> Self {
        Self {
            client,
            elections: Coll::from_db(db),
            eligibility: Coll::from_db(db),
            ballots: Coll::from_db(db),
        }
    }

    /// Flip the flag and insert the ballot inside the session's open transaction.
    async fn mark_voted_in_session(
        &self,
        ballot: &RecordedBallot,
        session: &mut ClientSession,
    ) -> Result<u64, DbError> {
        let filter = doc! {
            "voter_id": ballot.voter_id,
            "election_id": ballot.election_id,
            "has_voted": false,
        };
        let update = doc! {
            "$set": {
                "has_voted": true,
                "voted_at": BsonDateTime::from_chrono(ballot.cast_at),
            }
        };
        let result = self
            .eligibility
            .update_one_with_session(filter, update, None, session)
            .await?;
        if result.modified_count == 1 {
            self.ballots
                .insert_one_with_session(ballot, None, session)
                .await?;
        }
        Ok(result.modified_count)
    }
}

/// Whether a ballot read back from the database is the one we tried to commit.
/// BSON datetimes only keep milliseconds, so compare at that precision.
fn is_same_ballot(stored: &RecordedBallot, ours: &RecordedBallot) -> bool {
    stored.voter_id == ours.voter_id
        && stored.election_id == ours.election_id
        && stored.payload == ours.payload
        && BsonDateTime::from_chrono(stored.cast_at) == BsonDateTime::from_chrono(ours.cast_at)
}

/// Commit the session's transaction, retrying while the outcome is unknown.
async fn commit_with_retry(session: &mut ClientSession) -> Result<(), DbError> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match session.commit_transaction().await {
            Err(e)
                if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                    && attempts < MAX_TRANSACTION_ATTEMPTS =>
            {
                warn!("Transaction commit result unknown, retrying: {e}");
            }
            result => return result,
        }
    }
}

#[rocket::async_trait]
impl RecordStore for MongoStore {
    async fn read_election(&self, election_id: Id) -> Result<Option<Election>, StoreError> {
        Ok(self.elections.find_one(election_id.as_doc(), None).await?)
    }

    async fn read_eligibility(
        &self,
        voter_id: Id,
        election_id: Id,
    ) -> Result<Option<EligibilityRecord>, StoreError> {
        let filter = doc! {
            "voter_id": voter_id,
            "election_id": election_id,
        };
        Ok(self.eligibility.find_one(filter, None).await?)
    }

    async fn eligibility_for_voter(
        &self,
        voter_id: Id,
    ) -> Result<Vec<(Election, EligibilityRecord)>, StoreError> {
        let records: Vec<EligibilityRecord> = self
            .eligibility
            .find(doc! { "voter_id": voter_id }, None)
            .await?
            .try_collect()
            .await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let election_ids: Vec<Id> = records.iter().map(|r| r.election_id).collect();
        let filter = doc! {
            "_id": { "$in": election_ids },
        };
        let mut elections: HashMap<Id, Election> = self
            .elections
            .find(filter, None)
            .await?
            .map_ok(|election| (election.id, election))
            .try_collect()
            .await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                elections
                    .remove(&record.election_id)
                    .map(|election| (election, record))
            })
            .collect())
    }

    async fn conditional_mark_voted(&self, ballot: &RecordedBallot) -> Result<u64, StoreError> {
        let mut session = self.client.start_session(None).await?;

        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            session.start_transaction(None).await?;
            let result = match self.mark_voted_in_session(ballot, &mut session).await {
                Ok(0) => {
                    session.abort_transaction().await?;
                    return Ok(0);
                }
                Ok(affected) => commit_with_retry(&mut session).await.map(|_| affected),
                Err(e) => {
                    // The server may already have aborted; the error we care about is `e`.
                    if let Err(abort_err) = session.abort_transaction().await {
                        trace!("Abort after failed vote transaction also failed: {abort_err}");
                    }
                    Err(e)
                }
            };

            match result {
                Ok(affected) => return Ok(affected),
                Err(e) if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT) => {
                    // The commit may still have landed; the stored ballot settles it.
                    let filter = doc! {
                        "voter_id": ballot.voter_id,
                        "election_id": ballot.election_id,
                    };
                    let stored = self.ballots.find_one(filter, None).await?;
                    if stored.map_or(false, |stored| is_same_ballot(&stored, ballot)) {
                        warn!(
                            "Commit result for voter {} in election {} was unknown, \
but the ballot is recorded",
                            ballot.voter_id, ballot.election_id
                        );
                        return Ok(1);
                    }
                    return Err(e.into());
                }
                Err(e) if e.contains_label(TRANSIENT_TRANSACTION_ERROR) => {
                    warn!(
                        "Vote transaction for voter {} in election {} conflicted \
(attempt {attempt}/{MAX_TRANSACTION_ATTEMPTS}): {e}",
                        ballot.voter_id, ballot.election_id
                    );
                    let backoff = TRANSACTION_BACKOFF_MILLIS * attempt as u64;
                    sleep(StdDuration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::TooManyAttempts(MAX_TRANSACTION_ATTEMPTS))
    }

    async fn insert_election(&self, election: &Election) -> Result<(), StoreError> {
        self.elections.insert_one(election, None).await?;
        Ok(())
    }

    async fn grant_eligibility(&self, voter_id: Id, election_id: Id) -> Result<Grant, StoreError> {
        if self
            .elections
            .find_one(election_id.as_doc(), None)
            .await?
            .is_none()
        {
            return Ok(Grant::UnknownElection);
        }

        // Only ever insert; an existing record (voted or not) is left alone.
        let filter = doc! {
            "voter_id": voter_id,
            "election_id": election_id,
        };
        let update = doc! {
            "$setOnInsert": {
                "has_voted": false,
                "voted_at": null,
            }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        match self.eligibility.update_one(filter, update, options).await {
            Ok(result) if result.upserted_id.is_some() => Ok(Grant::Granted),
            Ok(_) => Ok(Grant::AlreadyEligible),
            // Lost a race with a concurrent grant for the same voter.
            Err(e) if is_duplicate_key(&e) => Ok(Grant::AlreadyEligible),
            Err(e) => Err(e.into()),
        }
    }
}
