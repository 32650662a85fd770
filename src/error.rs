use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use rocket::{
    http::{Status, StatusClass},
    response::{status::Custom, Responder},
    Request,
};
use thiserror::Error;

use crate::ledger::{Rejection, StoreError};
use crate::logging::RequestId;

pub type Result<T> = std::result::Result<T, Error>;

/// Shown instead of any internal detail when something on our side went wrong.
pub const RETRY_MESSAGE: &str = "Something went wrong on our side; please try again";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("Vote rejected: {0:?}")]
    Rejected(Rejection),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Construct an `Error::NotFound` with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// The status code and the message it is safe to show the user.
    fn status_and_message(&self) -> (Status, String) {
        match self {
            Self::Storage(_) => (Status::ServiceUnavailable, RETRY_MESSAGE.to_string()),
            Self::Internal(_) => (Status::InternalServerError, RETRY_MESSAGE.to_string()),
            Self::Jwt(_) | Self::Unauthorized(_) => {
                (Status::Unauthorized, "Please sign in again".to_string())
            }
            // Unknown elections and missing eligibility look the same from outside.
            Self::Rejected(Rejection::NotEligible) | Self::NotFound(_) => {
                (Status::NotFound, Rejection::NotEligible.to_string())
            }
            Self::BadRequest(msg) => (Status::BadRequest, msg.clone()),
            Self::Rejected(reason @ (Rejection::NotYetOpen | Rejection::AlreadyClosed)) => {
                (Status::Forbidden, reason.to_string())
            }
            Self::Rejected(reason @ Rejection::AlreadyVoted) => {
                (Status::Conflict, reason.to_string())
            }
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let (status, message) = self.status_and_message();
        let id = RequestId::of(req);
        if matches!(status.class(), StatusClass::ServerError) {
            error!("{id} {} {}: {self}", req.method(), req.uri());
        } else {
            warn!("{id} {} {}: {self}", req.method(), req.uri());
        }
        Custom(status, message).respond_to(req)
    }
}
