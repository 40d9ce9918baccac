use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::EligibilityFilter,
    db::election::{Election, NewElection},
    mongodb::Id,
};

/// An election specification, as submitted by an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    pub university: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub eligibility: EligibilityFilter,
}

impl ElectionSpec {
    /// Reject malformed specs before anything touches the database.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("Election title must not be empty"));
        }
        if self.university.trim().is_empty() {
            return Err(Error::validation("Election university must not be empty"));
        }
        if self.eligibility.university.trim().is_empty() {
            return Err(Error::validation("Eligibility university must not be empty"));
        }
        if self.start_date >= self.end_date {
            return Err(Error::validation(
                "Election start date must be before its end date",
            ));
        }
        Ok(())
    }

    /// Convert into an insertable election created by the given admin.
    pub fn into_new_election(self, created_by: Id) -> NewElection {
        NewElection {
            title: self.title,
            description: self.description,
            class: self.class,
            department: self.department,
            university: self.university,
            start_date: self.start_date,
            end_date: self.end_date,
            created_by,
            eligibility: self.eligibility,
            is_active: true,
            candidates: Vec::new(),
        }
    }
}

/// Summary line for election listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: Id,
    pub title: String,
    pub university: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.election.title,
            university: election.election.university,
            start_date: election.election.start_date,
            end_date: election.election.end_date,
            is_active: election.election.is_active,
        }
    }
}

/// Full election details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionDescription {
    pub id: Id,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub university: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: Id,
    pub eligibility: EligibilityFilter,
    pub is_active: bool,
    pub candidates: Vec<Id>,
}

impl From<Election> for ElectionDescription {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            title: election.election.title,
            description: election.election.description,
            class: election.election.class,
            department: election.election.department,
            university: election.election.university,
            start_date: election.election.start_date,
            end_date: election.election.end_date,
            created_by: election.election.created_by,
            eligibility: election.election.eligibility,
            is_active: election.election.is_active,
            candidates: election.election.candidates,
        }
    }
}
