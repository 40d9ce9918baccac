use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{db::voter::Voter, mongodb::Id};

/// Core candidacy data, as stored in the database.
///
/// Department and university are snapshots of the voter's profile at
/// registration time; later profile edits do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateCore {
    /// Foreign key voter ID.
    pub voter_id: Id,
    /// Foreign key election ID.
    pub election_id: Id,
    pub manifesto: String,
    pub department: String,
    pub university: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub registered_at: DateTime<Utc>,
}

impl CandidateCore {
    /// A candidacy for the given voter, snapshotting their profile.
    pub fn new(voter: &Voter, election_id: Id, manifesto: String) -> Self {
        Self {
            voter_id: voter.id,
            election_id,
            manifesto,
            department: voter.profile.department.clone(),
            university: voter.profile.university.clone(),
            registered_at: Utc::now(),
        }
    }
}

/// A candidacy without an ID, ready for insertion.
pub type NewCandidate = CandidateCore;

/// A candidacy from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}
