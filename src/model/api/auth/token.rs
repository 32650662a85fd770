use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    time::Duration,
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::mongodb::Id;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token identifying a voter.
///
/// Tokens are issued by the identity provider, which shares our JWT secret; we only ever
/// verify them and hand the voter ID to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub id: Id,
}

impl AuthToken {
    pub fn new(voter_id: Id) -> Self {
        Self { id: voter_id }
    }

    /// The authenticated voter.
    pub fn id(&self) -> Id {
        self.id
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialize this token into a cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize a token from a cookie, checking its signature and expiry.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => {
                let err = Error::Internal("application config is not managed".to_string());
                return Outcome::Failure((Status::InternalServerError, err));
            }
        };

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => {
                let err = Error::Unauthorized("no authentication token".to_string());
                return Outcome::Failure((Status::Unauthorized, err));
            }
        };

        match Self::from_cookie(cookie, config) {
            Ok(token) => Outcome::Success(token),
            Err(err) => Outcome::Failure((Status::Unauthorized, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    #[test]
    fn cookie_roundtrip() {
        let config = Config::example();
        let token = AuthToken::new(Id::new());
        let cookie = token.clone().into_cookie(&config);
        assert_eq!(cookie.name(), AUTH_TOKEN_COOKIE);
        assert_eq!(AuthToken::from_cookie(&cookie, &config).unwrap(), token);
    }

    #[test]
    fn reject_foreign_signature() {
        let config = Config::example();
        let other = Config::with_secret("somebody else's secret");

        let cookie = AuthToken::new(Id::new()).into_cookie(&other);
        assert!(matches!(
            AuthToken::from_cookie(&cookie, &config),
            Err(Error::Jwt(_))
        ));
    }

    #[test]
    fn reject_expired() {
        let config = Config::example();
        let claims = Claims {
            token: AuthToken::new(Id::new()),
            expire_at: Utc::now() - ChronoDuration::hours(1),
        };
        let jwt = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .unwrap();
        let cookie = Cookie::new(AUTH_TOKEN_COOKIE, jwt);
        assert!(matches!(
            AuthToken::from_cookie(&cookie, &config),
            Err(Error::Jwt(_))
        ));
    }
}
