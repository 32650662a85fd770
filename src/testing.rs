//! Shared fixtures for `#[backend_test]` tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rocket::{figment::Figment, http::Cookie, local::asynchronous::Client};

use crate::{
    config::Config,
    ledger::{Grant, Ledger, ManualClock, MemoryStore, RecordStore},
    model::{api::auth::AuthToken, db::Election, mongodb::Id},
};

pub type TestStore = Arc<MemoryStore>;
pub type TestClock = Arc<ManualClock>;

/// The instant every test clock starts at.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 3, 1, 9, 0, 0).unwrap()
}

/// Insert the election if it is new, and make the voter eligible for it.
pub async fn seed(store: &TestStore, election: &Election, voter_id: Id) {
    if store.read_election(election.id).await.unwrap().is_none() {
        store.insert_election(election).await.unwrap();
    }
    assert_eq!(
        store.grant_eligibility(voter_id, election.id).await.unwrap(),
        Grant::Granted
    );
}

/// A signed auth cookie for the voter, as the identity provider would issue.
pub fn voter_cookie(client: &Client, voter_id: Id) -> Cookie<'static> {
    let config = client.rocket().state::<Config>().unwrap();
    AuthToken::new(voter_id).into_cookie(config)
}

/// Build a local client over an in-memory ledger.
pub async fn setup() -> (Client, TestStore, TestClock) {
    log4rs_test_utils::test_logging::init_logging_once_for(["evote_backend"], None, None);

    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let ledger = Ledger::new(store.clone(), clock.clone());

    let figment = Figment::from(rocket::Config::debug_default())
        .merge(("jwt_secret", "backend test secret"))
        .merge(("auth_ttl", 3600))
        .merge(("log_level", "off"));
    let rocket = crate::rocket_for_ledger(rocket::custom(figment), ledger);
    let client = Client::tracked(rocket).await.unwrap();

    (client, store, clock)
}
