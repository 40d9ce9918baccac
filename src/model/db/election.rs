use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::EligibilityFilter, mongodb::Id};

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional class scope for display purposes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub university: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    /// The admin subject that created this election; the only principal
    /// allowed to delete it or declare its results.
    pub created_by: Id,
    pub eligibility: EligibilityFilter,
    /// Advisory flag; flipped to false exactly once, by result
    /// declaration. All state-machine decisions compare timestamps
    /// server-side instead of trusting this.
    pub is_active: bool,
    /// Candidate IDs in registration order. This array is the
    /// authoritative ordering for candidate listings and for result
    /// tie-breaks.
    pub candidates: Vec<Id>,
}

impl ElectionCore {
    /// Is the election open for ballots at the given instant?
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// Has the election finished at the given instant?
    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date
    }
}

/// An election without an ID, ready for insertion.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::Duration;

    use super::*;

    impl ElectionCore {
        /// An election that is currently open for ballots.
        pub fn example_open(created_by: Id) -> Self {
            Self {
                title: "Student Union President".to_string(),
                description: Some("Annual presidential election".to_string()),
                class: None,
                department: None,
                university: "Example University".to_string(),
                start_date: Utc::now() - Duration::hours(1),
                end_date: Utc::now() + Duration::days(1),
                created_by,
                eligibility: EligibilityFilter {
                    university: "Example University".to_string(),
                    department: None,
                    class: None,
                },
                is_active: true,
                candidates: Vec::new(),
            }
        }

        /// An election whose voting window has already closed.
        pub fn example_ended(created_by: Id) -> Self {
            Self {
                title: "Department Representative".to_string(),
                start_date: Utc::now() - Duration::days(2),
                end_date: Utc::now() - Duration::hours(1),
                ..Self::example_open(created_by)
            }
        }

        /// An election that has not yet opened.
        pub fn example_future(created_by: Id) -> Self {
            Self {
                title: "Sports Secretary".to_string(),
                start_date: Utc::now() + Duration::days(1),
                end_date: Utc::now() + Duration::days(2),
                ..Self::example_open(created_by)
            }
        }
    }
}
