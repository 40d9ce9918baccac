use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The public profile fields of a voter, as rendered alongside
/// candidacies and results. Maintained by the external account system;
/// the core only reads them (and snapshots some at registration time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub class: String,
    pub department: String,
    pub university: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub bio: String,
}

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterCore {
    #[serde(flatten)]
    pub profile: Profile,
    /// Elections this voter stands in. Denormalised from the candidates
    /// collection; maintained under the registration transaction.
    #[serde(default)]
    pub candidacies: Vec<Id>,
    /// Elections this voter has cast a ballot in. Denormalised from the
    /// votes collection; maintained under the cast transaction.
    #[serde(default)]
    pub voted_elections: Vec<Id>,
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with their unique ID. The ID doubles as
/// the subject ID the identity provider asserts for this voter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl VoterCore {
        pub fn example(name: &str) -> Self {
            Self {
                profile: Profile {
                    name: name.to_string(),
                    class: "2025".to_string(),
                    department: "Computer Science".to_string(),
                    university: "Example University".to_string(),
                    img: String::new(),
                    bio: String::new(),
                },
                candidacies: Vec::new(),
                voted_elections: Vec::new(),
            }
        }

        /// A voter from a different university, ineligible for the
        /// example elections.
        pub fn example_other_university(name: &str) -> Self {
            let mut voter = Self::example(name);
            voter.profile.university = "Other University".to_string();
            voter
        }
    }

    impl Voter {
        pub fn example(name: &str) -> Self {
            Self {
                id: Id::new(),
                voter: VoterCore::example(name),
            }
        }
    }
}
