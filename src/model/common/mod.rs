//! Types shared between the database, ledger, and API representations.

pub mod ballot;
pub mod election;
