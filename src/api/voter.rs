use log::debug;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    ledger::Ledger,
    logging::RequestId,
    model::{api::auth::AuthToken, api::election::EligibleElectionView, mongodb::Id},
};

pub fn routes() -> Vec<Route> {
    routes![eligible_elections, eligible_election]
}

#[get("/voter/elections")]
async fn eligible_elections(
    token: AuthToken,
    ledger: &State<Ledger>,
) -> Result<Json<Vec<EligibleElectionView>>> {
    let elections = ledger
        .eligible_elections(token.id())
        .await?
        .into_iter()
        .map(EligibleElectionView::from)
        .collect();
    Ok(Json(elections))
}

#[get("/voter/elections/<election_id>")]
async fn eligible_election(
    request_id: RequestId,
    token: AuthToken,
    ledger: &State<Ledger>,
    election_id: Id,
) -> Result<Json<EligibleElectionView>> {
    let voter_id = token.id();
    let election = ledger
        .eligible_election(voter_id, election_id)
        .await?
        .ok_or_else(|| {
            Error::not_found(format!(
                "Voter {voter_id} is not eligible for election {election_id}"
            ))
        })?;
    debug!(
        "{request_id} voter {voter_id} sees election {election_id} as {:?}",
        election.eligibility
    );
    Ok(Json(election.into()))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{http::Status, local::asynchronous::Client};

    use crate::ledger::{Clock, Phase, Rejection};
    use crate::model::{common::ballot::BallotPayload, db::Election};
    use crate::testing::{seed, t0, voter_cookie, TestClock, TestStore};

    use super::*;

    #[backend_test]
    async fn dashboard_requires_sign_in(client: Client) {
        let response = client.get(uri!(eligible_elections)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn dashboard_rejects_forged_token(client: Client) {
        let forged = AuthToken::new(Id::new())
            .into_cookie(&crate::config::Config::with_secret("not the server's secret"));
        let response = client
            .get(uri!(eligible_elections))
            .cookie(forged)
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn dashboard_lists_newest_first(
        client: Client,
        ledger: Ledger,
        store: TestStore,
        clock: TestClock,
    ) {
        let voter = Id::new();
        let old = Election::closed_example(t0() - Duration::days(1));
        let current = Election::active_example(t0() - Duration::minutes(10));
        let future = Election::pending_example(t0() + Duration::days(1));
        for election in [&old, &future, &current] {
            seed(&store, election, voter).await;
        }
        assert_eq!(clock.now(), t0());
        ledger
            .commit_vote(voter, old.id, BallotPayload::example())
            .await
            .unwrap();

        let response = client
            .get(uri!(eligible_elections))
            .cookie(voter_cookie(&client, voter))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let listed = response
            .into_json::<Vec<EligibleElectionView>>()
            .await
            .unwrap();
        let ids: Vec<_> = listed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![future.id, current.id, old.id]);

        assert_eq!(listed[0].phase, Phase::Upcoming);
        assert!(!listed[0].can_vote);
        assert_eq!(listed[0].reason, Some(Rejection::NotYetOpen.to_string()));
        assert_eq!(listed[1].phase, Phase::Active);
        assert!(listed[1].can_vote);
        assert_eq!(listed[1].reason, None);
        assert_eq!(listed[2].phase, Phase::Closed);
        assert!(!listed[2].has_voted);
        assert_eq!(listed[2].reason, Some(Rejection::AlreadyClosed.to_string()));
    }

    #[backend_test]
    async fn empty_dashboard(client: Client) {
        let response = client
            .get(uri!(eligible_elections))
            .cookie(voter_cookie(&client, Id::new()))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let listed = response
            .into_json::<Vec<EligibleElectionView>>()
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[backend_test]
    async fn single_election(client: Client, store: TestStore, clock: TestClock) {
        let voter = Id::new();
        let election = Election::active_example(t0());
        seed(&store, &election, voter).await;
        clock.set(t0() + Duration::minutes(59));

        let response = client
            .get(uri!(eligible_election(election.id)))
            .cookie(voter_cookie(&client, voter))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let view = response.into_json::<EligibleElectionView>().await.unwrap();
        assert_eq!(view.id, election.id);
        assert_eq!(view.title, election.title);
        assert_eq!(view.start_time, election.start_time);
        assert!(view.can_vote);

        // Someone else cannot see it.
        let response = client
            .get(uri!(eligible_election(election.id)))
            .cookie(voter_cookie(&client, Id::new()))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }
}
