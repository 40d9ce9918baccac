use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// One line of a declared result, joined with display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub candidate_id: Id,
    pub name: String,
    pub votes: u64,
    pub rank: u32,
}

/// The winning candidate's display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerInfo {
    pub candidate_id: Id,
    pub name: String,
}

/// A declared election result, as rendered to both admins and voters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultView {
    pub election_id: Id,
    /// In rank order: descending votes, ties in registration order.
    pub rankings: Vec<RankingEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<WinnerInfo>,
    pub declared_at: DateTime<Utc>,
}
