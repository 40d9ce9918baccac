use chrono::Utc;
use mongodb::{bson::doc, options::ReplaceOptions, Client};
use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::result::{RankingEntry, ResultView, WinnerInfo},
    auth::{Admin, AnyToken, AuthToken},
    db::{
        candidate::Candidate,
        election::Election,
        result::{CandidateRanking, ElectionResult, NewElectionResult, ResultCore},
        vote::Vote,
        voter::Voter,
    },
    mongodb::{Coll, Id},
};

use super::common;

pub fn routes() -> Vec<Route> {
    routes![declare_results, get_results]
}

#[post("/elections/<election_id>/results")]
async fn declare_results(
    token: AuthToken<Admin>,
    election_id: Id,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    new_results: Coll<NewElectionResult>,
    voters: Coll<Voter>,
    db_client: &State<Client>,
) -> Result<Json<ResultView>> {
    let election = common::election_by_id(election_id, &elections).await?;
    if election.created_by != token.id {
        return Err(Error::unauthorized(format!(
            "Only the creating admin may declare results for election '{election_id}'"
        )));
    }
    if !election.has_ended_at(Utc::now()) {
        return Err(Error::ElectionStillActive(election_id));
    }

    // Tally, rank, and persist under one transaction so the counts all
    // come from the same snapshot and the stored result is replaced
    // atomically. Re-running after a crash simply recomputes.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let election = elections
        .find_one_with_session(election_id.as_doc(), None, &mut session)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with ID '{election_id}'")))?;

    let mut tallies = Vec::with_capacity(election.candidates.len());
    for &candidate_id in &election.candidates {
        let count = votes
            .count_documents_with_session(
                doc! { "candidate_id": candidate_id, "election_id": election_id },
                None,
                &mut session,
            )
            .await?;
        tallies.push((candidate_id, count));
    }
    // Stable sort: equal counts keep registration order.
    tallies.sort_by(|a, b| b.1.cmp(&a.1));

    let rankings = tallies
        .iter()
        .enumerate()
        .map(|(index, &(candidate_id, votes))| CandidateRanking {
            candidate_id,
            votes,
            rank: index as u32 + 1,
        })
        .collect::<Vec<_>>();
    let winner = rankings.first().map(|ranking| ranking.candidate_id);
    let result = ResultCore {
        election_id,
        rankings,
        winner,
        declared_at: Utc::now(),
    };

    let options = ReplaceOptions::builder().upsert(true).build();
    new_results
        .replace_one_with_session(
            doc! { "election_id": election_id },
            &result,
            options,
            &mut session,
        )
        .await?;
    elections
        .update_one_with_session(
            election_id.as_doc(),
            doc! { "$set": { "is_active": false } },
            None,
            &mut session,
        )
        .await?;

    session.commit_transaction().await?;

    Ok(Json(result_view(result, &candidates, &voters).await?))
}

#[get("/elections/<election_id>/results")]
async fn get_results(
    _token: AnyToken,
    election_id: Id,
    elections: Coll<Election>,
    results: Coll<ElectionResult>,
    candidates: Coll<Candidate>,
    voters: Coll<Voter>,
) -> Result<Json<ResultView>> {
    common::election_by_id(election_id, &elections).await?;
    let result = results
        .find_one(doc! { "election_id": election_id }, None)
        .await?
        .ok_or_else(|| {
            Error::not_found(format!("Declared results for election '{election_id}'"))
        })?;
    Ok(Json(
        result_view(result.result, &candidates, &voters).await?,
    ))
}

/// Join a stored result with display names for rendering.
async fn result_view(
    result: ResultCore,
    candidates: &Coll<Candidate>,
    voters: &Coll<Voter>,
) -> Result<ResultView> {
    let mut rankings = Vec::with_capacity(result.rankings.len());
    for ranking in result.rankings {
        let name = candidate_name(ranking.candidate_id, candidates, voters).await?;
        rankings.push(RankingEntry {
            candidate_id: ranking.candidate_id,
            name,
            votes: ranking.votes,
            rank: ranking.rank,
        });
    }
    let winner = match result.winner {
        Some(candidate_id) => Some(WinnerInfo {
            candidate_id,
            name: candidate_name(candidate_id, candidates, voters).await?,
        }),
        None => None,
    };
    Ok(ResultView {
        election_id: result.election_id,
        rankings,
        winner,
        declared_at: result.declared_at,
    })
}

async fn candidate_name(
    candidate_id: Id,
    candidates: &Coll<Candidate>,
    voters: &Coll<Voter>,
) -> Result<String> {
    let candidate = candidates
        .find_one(candidate_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Candidate with ID '{candidate_id}'")))?;
    let voter = voters
        .find_one(candidate.voter_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Voter with ID '{}'", candidate.voter_id)))?;
    Ok(voter.voter.profile.name)
}
