//! The voting ledger: election phases, the eligibility gate, and at-most-once vote commits.

mod clock;
mod commit;
mod gate;
mod memory;
mod phase;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commit::{CommitOutcome, EligibleElection, Ledger};
pub use gate::{can_vote, Eligibility, Rejection};
pub use memory::MemoryStore;
pub use phase::{resolve_phase, Phase};
pub use store::{Grant, RecordStore, StoreError};
