use rocket::{http::Status, response::Responder};
use thiserror::Error;

use crate::model::mongodb::Id;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while serving a request.
///
/// The domain variants are terminal for the triggering call and map onto
/// user-facing HTTP statuses; the infrastructure variants surface as
/// internal errors. Storage-layer uniqueness violations never leak raw:
/// they are translated into [`Error::DuplicateCandidacy`] or
/// [`Error::AlreadyVoted`] at the insertion site.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    OidParse(#[from] mongodb::bson::oid::Error),
    #[error("Bad request: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Election {0} is not open for voting")]
    ElectionNotActive(Id),
    #[error("Election {0} has already closed")]
    ElectionClosed(Id),
    #[error("Election {0} has not yet ended")]
    ElectionStillActive(Id),
    #[error("Voter {voter_id} is already a candidate in election {election_id}")]
    DuplicateCandidacy { voter_id: Id, election_id: Id },
    #[error("Voter {voter_id} has already voted in election {election_id}")]
    AlreadyVoted { voter_id: Id, election_id: Id },
    #[error("Candidate {candidate_id} not found in election {election_id}")]
    CandidateNotFound { candidate_id: Id, election_id: Id },
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn unauthorized(why: impl Into<String>) -> Self {
        Self::Unauthorized(why.into())
    }

    pub fn validation(why: impl Into<String>) -> Self {
        Self::Validation(why.into())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match self {
            Self::Db(_) | Self::Jwt(_) => Status::InternalServerError,
            Self::OidParse(_) | Self::Validation(_) => Status::BadRequest,
            Self::Unauthorized(_) => Status::Forbidden,
            Self::NotFound(_) | Self::CandidateNotFound { .. } => Status::NotFound,
            Self::ElectionNotActive(_) | Self::ElectionClosed(_) | Self::ElectionStillActive(_) => {
                Status::BadRequest
            }
            Self::DuplicateCandidacy { .. } | Self::AlreadyVoted { .. } => Status::Conflict,
        };
        match status.class() {
            rocket::http::StatusClass::ServerError => {
                error!("{} {} failed: {}", req.method(), req.uri(), self)
            }
            _ => debug!("{} {} rejected: {}", req.method(), req.uri(), self),
        }
        Err(status)
    }
}
