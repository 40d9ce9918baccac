//! API-compatible types: the wire DTOs exchanged with the presentation
//! layer. Datetimes here are RFC 3339 strings rather than BSON values.

pub mod candidate;
pub mod election;
pub mod result;
pub mod vote;

pub use candidate::{CandidacyRequest, CandidateInfo};
pub use election::{ElectionDescription, ElectionSpec, ElectionSummary};
pub use result::{RankingEntry, ResultView, WinnerInfo};
pub use vote::VoteRequest;
