//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs and datetimes are serialised in MongoDB's own format.

mod ballot;
pub use ballot::RecordedBallot;

mod election;
pub use election::{Election, InvalidElection};

mod eligibility;
pub use eligibility::EligibilityRecord;
