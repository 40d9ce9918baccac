use std::marker::PhantomData;

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome, Request},
    State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::mongodb::Id;

use super::Principal;

pub const AUTH_HEADER: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

/// The role an authenticated principal acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Voter,
    Admin,
}

/// The claims carried by an identity-provider token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject ID, as a hex ObjectId.
    pub sub: String,
    #[serde(rename = "rol")]
    pub role: Role,
    /// Expiry, as a unix timestamp. Validated on decode.
    pub exp: i64,
}

/// A verified identity claim for a principal of type `U`.
///
/// As a request guard this admits only tokens whose role matches
/// `U::ROLE`; mismatches forward so that differently-typed routes at the
/// same path can still match.
pub struct AuthToken<U> {
    pub id: Id,
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U>
where
    U: Principal,
{
    /// A token for the given subject, with the rights of `U`.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            phantom: PhantomData,
        }
    }

    /// Sign this token the way the identity provider does.
    /// Used by tests and by the provider's own tooling.
    pub fn encode(&self, config: &Config) -> Result<String> {
        let claims = Claims {
            sub: self.id.to_hex(),
            role: U::ROLE,
            exp: (Utc::now() + config.auth_ttl()).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(token)
    }

    /// Verify a bearer token and check it carries the rights of `U`.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        let claims = decode_claims(token, config)?;
        if claims.role != U::ROLE {
            return Err(Error::unauthorized(format!(
                "Token does not grant {:?} rights",
                U::ROLE
            )));
        }
        Ok(Self::new(claims.sub.parse()?))
    }
}

/// A verified identity claim for a principal of any role.
/// Used by read-only routes that both voters and admins may call.
pub struct AnyToken {
    pub id: Id,
    pub role: Role,
}

fn decode_claims(token: &str, config: &Config) -> Result<Claims> {
    let data: TokenData<Claims> = jsonwebtoken::decode(
        token,
        &DecodingKey::from_secret(config.jwt_secret()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn bearer_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    req.headers()
        .get_one(AUTH_HEADER)
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: Principal,
{
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        // Forward if there is no token or it doesn't grant these rights,
        // so lower-ranked routes get a chance.
        let token = try_outcome!(bearer_token(req).or_forward(()));
        match Self::decode(token, config) {
            Ok(token) => Outcome::Success(token),
            Err(_) => Outcome::Forward(()),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AnyToken {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = req.guard::<&State<Config>>().await.unwrap();

        let token = try_outcome!(bearer_token(req).or_forward(()));
        let claims = match decode_claims(token, config) {
            Ok(claims) => claims,
            Err(_) => return Outcome::Forward(()),
        };
        match claims.sub.parse::<Id>() {
            Ok(id) => Outcome::Success(AnyToken {
                id,
                role: claims.role,
            }),
            Err(_) => Outcome::Forward(()),
        }
    }
}
