use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    ledger::{CommitOutcome, Ledger},
    logging::RequestId,
    model::{
        api::{auth::AuthToken, ballot::VoteConfirmation},
        common::ballot::BallotPayload,
        mongodb::Id,
    },
};

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

#[post("/voter/elections/<election_id>/vote", data = "<ballot>", format = "json")]
async fn cast_vote(
    request_id: RequestId,
    token: AuthToken,
    ledger: &State<Ledger>,
    election_id: Id,
    ballot: Json<BallotPayload>,
) -> Result<Json<VoteConfirmation>> {
    let ballot = ballot.into_inner();
    if ballot.is_empty() {
        return Err(Error::BadRequest("The ballot is empty".to_string()));
    }

    let voter_id = token.id();
    match ledger.cast_vote(voter_id, election_id, ballot).await? {
        CommitOutcome::Committed { committed_at } => {
            info!("{request_id} recorded vote by {voter_id} in election {election_id}");
            Ok(Json(VoteConfirmation {
                election_id,
                committed_at,
            }))
        }
        CommitOutcome::Rejected(reason) => {
            info!("{request_id} turned away vote by {voter_id} in election {election_id}: {reason:?}");
            Err(Error::Rejected(reason))
        }
    }
}
