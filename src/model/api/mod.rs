//! API-friendly types, serialised as plain JSON for the front end.

pub mod auth;
pub mod ballot;
pub mod election;
