use crate::error::{Error, Result};
use crate::model::{
    auth::AuthToken,
    db::{election::Election, voter::Voter},
    mongodb::{Coll, Id},
};

/// Look up an election by ID.
pub async fn election_by_id(election_id: Id, elections: &Coll<Election>) -> Result<Election> {
    elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))
}

/// Return the voter profile behind the given identity token.
pub async fn voter_by_token(token: &AuthToken<Voter>, voters: &Coll<Voter>) -> Result<Voter> {
    voters
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter with ID '{}'", token.id)))
}
