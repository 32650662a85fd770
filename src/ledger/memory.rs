use std::collections::{hash_map::Entry as MapEntry, HashMap};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(test)]
use rocket::tokio::sync::OwnedMutexGuard;
use rocket::tokio::sync::{Mutex, RwLock};

use crate::model::{
    db::{Election, EligibilityRecord, RecordedBallot},
    mongodb::Id,
};

use super::store::{Grant, RecordStore, StoreError};

/// `(voter_id, election_id)`.
type Key = (Id, Id);

/// A voter's record in one election, stored together with the ballot it allowed.
#[derive(Debug)]
struct Slot {
    record: EligibilityRecord,
    ballot: Option<RecordedBallot>,
}

/// A record store held entirely in memory.
///
/// Each `(voter, election)` pair has its own lock, covering both the eligibility record
/// and the ballot, so the conditional transition is atomic per key. The shared maps are
/// only locked long enough to find or insert a slot, so commits for distinct pairs never
/// wait on each other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    elections: RwLock<HashMap<Id, Election>>,
    slots: RwLock<HashMap<Key, Arc<Mutex<Slot>>>>,
    #[cfg(test)]
    fail_next_write: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, key: Key) -> Option<Arc<Mutex<Slot>>> {
        self.slots.read().await.get(&key).cloned()
    }

    /// Slots matching the predicate, detached from the shared map.
    async fn slots_where(&self, keep: impl Fn(&Key) -> bool) -> Vec<Arc<Mutex<Slot>>> {
        self.slots
            .read()
            .await
            .iter()
            .filter(|(key, _)| keep(*key))
            .map(|(_, slot)| slot.clone())
            .collect()
    }

    /// All recorded ballots for the given election, oldest first.
    pub async fn ballots_for(&self, election_id: Id) -> Vec<RecordedBallot> {
        let mut ballots = Vec::new();
        for slot in self.slots_where(|(_, election)| *election == election_id).await {
            if let Some(ballot) = &slot.lock().await.ballot {
                ballots.push(ballot.clone());
            }
        }
        ballots.sort_by_key(|ballot| ballot.cast_at);
        ballots
    }

    /// Make the next ballot write fail, after the eligibility update has been staged.
    #[cfg(test)]
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn take_injected_failure(&self) -> bool {
        self.fail_next_write.swap(false, Ordering::SeqCst)
    }

    #[cfg(not(test))]
    fn take_injected_failure(&self) -> bool {
        false
    }

    /// Lock one pair's slot, as an in-flight commit would.
    #[cfg(test)]
    async fn hold(&self, voter_id: Id, election_id: Id) -> OwnedMutexGuard<Slot> {
        let slot = self.slot((voter_id, election_id)).await.unwrap();
        slot.lock_owned().await
    }
}

#[rocket::async_trait]
impl RecordStore for MemoryStore {
    async fn read_election(&self, election_id: Id) -> Result<Option<Election>, StoreError> {
        Ok(self.elections.read().await.get(&election_id).cloned())
    }

    async fn read_eligibility(
        &self,
        voter_id: Id,
        election_id: Id,
    ) -> Result<Option<EligibilityRecord>, StoreError> {
        Ok(match self.slot((voter_id, election_id)).await {
            Some(slot) => Some(slot.lock().await.record.clone()),
            None => None,
        })
    }

    async fn eligibility_for_voter(
        &self,
        voter_id: Id,
    ) -> Result<Vec<(Election, EligibilityRecord)>, StoreError> {
        let mut records = Vec::new();
        for slot in self.slots_where(|(voter, _)| *voter == voter_id).await {
            records.push(slot.lock().await.record.clone());
        }

        let elections = self.elections.read().await;
        Ok(records
            .into_iter()
            .filter_map(|record| {
                elections
                    .get(&record.election_id)
                    .map(|election| (election.clone(), record))
            })
            .collect())
    }

    async fn conditional_mark_voted(&self, ballot: &RecordedBallot) -> Result<u64, StoreError> {
        let slot = match self.slot((ballot.voter_id, ballot.election_id)).await {
            Some(slot) => slot,
            None => return Ok(0),
        };
        let mut slot = slot.lock().await;
        if slot.record.has_voted {
            return Ok(0);
        }

        if self.take_injected_failure() {
            return Err(StoreError::Unavailable(
                "injected failure while writing ballot".to_string(),
            ));
        }

        // Both writes happen under the slot's lock with no await in between.
        slot.record.has_voted = true;
        slot.record.voted_at = Some(ballot.cast_at);
        slot.ballot = Some(ballot.clone());
        Ok(1)
    }

    async fn insert_election(&self, election: &Election) -> Result<(), StoreError> {
        self.elections
            .write()
            .await
            .insert(election.id, election.clone());
        Ok(())
    }

    async fn grant_eligibility(&self, voter_id: Id, election_id: Id) -> Result<Grant, StoreError> {
        if !self.elections.read().await.contains_key(&election_id) {
            return Ok(Grant::UnknownElection);
        }
        match self.slots.write().await.entry((voter_id, election_id)) {
            MapEntry::Occupied(_) => Ok(Grant::AlreadyEligible),
            MapEntry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(Slot {
                    record: EligibilityRecord::new(voter_id, election_id),
                    ballot: None,
                })));
                Ok(Grant::Granted)
            }
        }
    }
}
