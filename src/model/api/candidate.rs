use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    db::{candidate::Candidate, voter::Profile},
    mongodb::Id,
};

/// A voter's request to stand in an election.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidacyRequest {
    pub manifesto: String,
}

/// A candidacy joined with the candidate's public profile, for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateInfo {
    pub id: Id,
    pub election_id: Id,
    pub manifesto: String,
    /// Department/university as snapshotted at registration time.
    pub department: String,
    pub university: String,
    pub registered_at: DateTime<Utc>,
    /// Current public profile of the standing voter.
    pub profile: Profile,
}

impl CandidateInfo {
    pub fn from_candidate(candidate: Candidate, profile: Profile) -> Self {
        Self {
            id: candidate.id,
            election_id: candidate.candidate.election_id,
            manifesto: candidate.candidate.manifesto,
            department: candidate.candidate.department,
            university: candidate.candidate.university,
            registered_at: candidate.candidate.registered_at,
            profile,
        }
    }
}
