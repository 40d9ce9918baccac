use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Core ballot data, as stored in the database. Immutable once cast.
///
/// The unique index on `(voter_id, election_id)` is the single source of
/// truth for the one-ballot-per-voter invariant; tallies are derived by
/// counting these documents, so there is no counter to drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteCore {
    /// Foreign key voter ID.
    pub voter_id: Id,
    /// Foreign key candidate ID.
    pub candidate_id: Id,
    /// Foreign key election ID.
    pub election_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl VoteCore {
    pub fn new(voter_id: Id, candidate_id: Id, election_id: Id) -> Self {
        Self {
            voter_id,
            candidate_id,
            election_id,
            cast_at: Utc::now(),
        }
    }
}

/// A ballot without an ID, ready for insertion.
pub type NewVote = VoteCore;

/// A ballot from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}
