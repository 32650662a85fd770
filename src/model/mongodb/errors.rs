//! Classification of the MongoDB server errors the store reacts to.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

/// Server error code for a unique index violation.
pub const DUPLICATE_KEY: i32 = 11000;

/// Whether the error is a unique index violation, as happens when two eligibility
/// grants for the same voter and election race each other.
pub fn is_duplicate_key(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(ref e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
