use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// One candidate's position in a declared result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRanking {
    pub candidate_id: Id,
    pub votes: u64,
    /// Dense rank, 1..=N.
    pub rank: u32,
}

/// Core result data, as stored in the database.
///
/// At most one result exists per election (unique index on
/// `election_id`); re-declaration replaces it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCore {
    /// Foreign key election ID.
    pub election_id: Id,
    /// Rankings in rank order: descending vote count, ties broken by
    /// registration order.
    pub rankings: Vec<CandidateRanking>,
    /// The candidate at rank 1, or `None` for a candidate-less election.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Id>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub declared_at: DateTime<Utc>,
}

/// A result without an ID, ready for upsert.
pub type NewElectionResult = ResultCore;

/// A result from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionResult {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub result: ResultCore,
}

impl Deref for ElectionResult {
    type Target = ResultCore;

    fn deref(&self) -> &Self::Target {
        &self.result
    }
}
