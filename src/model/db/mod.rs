//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way:
//! IDs and datetimes use MongoDB's own formats. Each entity follows the
//! same pattern: a `*Core` struct holding the document fields, a `New*`
//! alias for insertion, and an `_id`-wrapped struct for documents read
//! back from the database.

pub mod candidate;
pub mod election;
pub mod result;
pub mod vote;
pub mod voter;

pub use candidate::{Candidate, CandidateCore, NewCandidate};
pub use election::{Election, ElectionCore, NewElection};
pub use result::{CandidateRanking, ElectionResult, NewElectionResult, ResultCore};
pub use vote::{NewVote, Vote, VoteCore};
pub use voter::{NewVoter, Profile, Voter, VoterCore};
