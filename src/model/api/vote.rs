use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A ballot the voter wishes to cast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub candidate_id: Id,
}
