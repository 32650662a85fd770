mod bson;
mod collection;
mod errors;
mod store;

pub use bson::{optional_datetime, Id};
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use store::{MongoStore, MAX_TRANSACTION_ATTEMPTS};
