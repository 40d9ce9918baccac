use std::collections::HashMap;

use chrono::Utc;
use mongodb::{bson::doc, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::candidate::{CandidacyRequest, CandidateInfo},
    auth::{AnyToken, AuthToken},
    db::{
        candidate::{Candidate, NewCandidate},
        election::Election,
        voter::Voter,
    },
    mongodb::{is_duplicate_key_error, Coll, Id},
};

use super::common;

pub fn routes() -> Vec<Route> {
    routes![register_candidate, list_candidates]
}

#[post("/elections/<election_id>/candidates", data = "<request>", format = "json")]
async fn register_candidate(
    token: AuthToken<Voter>,
    election_id: Id,
    request: Json<CandidacyRequest>,
    elections: Coll<Election>,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    new_candidates: Coll<NewCandidate>,
    db_client: &State<Client>,
) -> Result<Json<CandidateInfo>> {
    let election = common::election_by_id(election_id, &elections).await?;
    if election.has_ended_at(Utc::now()) {
        return Err(Error::ElectionClosed(election_id));
    }

    // Fast-path duplicate check; the unique index below is the arbiter
    // under concurrency.
    let existing = candidates
        .find_one(
            doc! { "voter_id": token.id, "election_id": election_id },
            None,
        )
        .await?;
    if existing.is_some() {
        return Err(Error::DuplicateCandidacy {
            voter_id: token.id,
            election_id,
        });
    }

    let manifesto = request.0.manifesto;
    if manifesto.trim().is_empty() {
        return Err(Error::validation("Manifesto must not be empty"));
    }

    let voter = common::voter_by_token(&token, &voters).await?;
    if !election.eligibility.is_eligible(&voter.profile) {
        return Err(Error::unauthorized(format!(
            "Voter does not meet the eligibility criteria of election '{election_id}'"
        )));
    }

    let candidate = NewCandidate::new(&voter, election_id, manifesto);

    // The insert, the registration-order append, and the profile
    // back-reference land together or not at all.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;
    let insert = new_candidates
        .insert_one_with_session(&candidate, None, &mut session)
        .await;
    let candidate_id: Id = match insert {
        Ok(result) => result.inserted_id.as_object_id().unwrap().into(),
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::DuplicateCandidacy {
                voter_id: voter.id,
                election_id,
            });
        }
        Err(err) => return Err(err.into()),
    };
    // The election may have been cascade-deleted since the check above;
    // the push doubles as an in-transaction existence check. Returning
    // here aborts the whole transaction, insert included.
    let pushed = elections
        .update_one_with_session(
            election_id.as_doc(),
            doc! { "$push": { "candidates": candidate_id } },
            None,
            &mut session,
        )
        .await?;
    if pushed.matched_count == 0 {
        return Err(Error::not_found(format!("Election with ID '{election_id}'")));
    }
    voters
        .update_one_with_session(
            voter.id.as_doc(),
            doc! { "$addToSet": { "candidacies": election_id } },
            None,
            &mut session,
        )
        .await?;
    session.commit_transaction().await?;

    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate with ID '{candidate_id}'")))?;
    Ok(Json(CandidateInfo::from_candidate(
        candidate,
        voter.voter.profile,
    )))
}

#[get("/elections/<election_id>/candidates")]
async fn list_candidates(
    _token: AnyToken,
    election_id: Id,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    voters: Coll<Voter>,
) -> Result<Json<Vec<CandidateInfo>>> {
    let election = common::election_by_id(election_id, &elections).await?;

    let found: Vec<Candidate> = candidates
        .find(doc! { "election_id": election_id }, None)
        .await?
        .try_collect()
        .await?;
    let mut by_id: HashMap<Id, Candidate> = found
        .into_iter()
        .map(|candidate| (candidate.id, candidate))
        .collect();

    // Render in registration order, joining each candidacy with the
    // standing voter's current profile.
    let mut infos = Vec::with_capacity(by_id.len());
    for candidate_id in &election.candidates {
        if let Some(candidate) = by_id.remove(candidate_id) {
            let voter = voters
                .find_one(candidate.voter_id.as_doc(), None)
                .await?
                .ok_or_else(|| {
                    Error::not_found(format!("Voter with ID '{}'", candidate.voter_id))
                })?;
            infos.push(CandidateInfo::from_candidate(candidate, voter.voter.profile));
        }
    }
    Ok(Json(infos))
}
