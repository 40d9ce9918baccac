//! Plain value types shared between the API and DB layers.

mod eligibility;

pub use eligibility::EligibilityFilter;
