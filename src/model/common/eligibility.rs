use serde::{Deserialize, Serialize};

use crate::model::db::voter::Profile;

/// The constraints a voter's profile must satisfy to participate in an
/// election. The university always applies; department and class only
/// constrain when set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityFilter {
    pub university: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl EligibilityFilter {
    /// Does the given profile satisfy this filter?
    ///
    /// Pure predicate, no side effects. Gates candidate registration and
    /// vote casting; the presentation layer may also call it to decide
    /// what to offer, but such client-side use is advisory only.
    pub fn is_eligible(&self, profile: &Profile) -> bool {
        if self.university != profile.university {
            return false;
        }
        if let Some(department) = &self.department {
            if department != &profile.department {
                return false;
            }
        }
        if let Some(class) = &self.class {
            if class != &profile.class {
                return false;
            }
        }
        true
    }
}
