use chrono::Utc;
use mongodb::bson::doc;
use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::vote::VoteRequest,
    auth::AuthToken,
    db::{
        candidate::Candidate,
        election::Election,
        vote::{NewVote, Vote, VoteCore},
        voter::Voter,
    },
    mongodb::{is_duplicate_key_error, Coll, Id},
};

use super::common;

pub fn routes() -> Vec<Route> {
    routes![cast_vote, vote_status]
}

#[post("/elections/<election_id>/votes", data = "<request>", format = "json")]
async fn cast_vote(
    token: AuthToken<Voter>,
    election_id: Id,
    request: Json<VoteRequest>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    new_votes: Coll<NewVote>,
    voters: Coll<Voter>,
) -> Result<()> {
    let election = common::election_by_id(election_id, &elections).await?;
    if !election.is_open_at(Utc::now()) {
        return Err(Error::ElectionNotActive(election_id));
    }

    // Fast-path duplicate check; the unique index at the insert below is
    // the arbiter under concurrency.
    let prior = votes
        .find_one(
            doc! { "voter_id": token.id, "election_id": election_id },
            None,
        )
        .await?;
    if prior.is_some() {
        // Re-assert the marker: a retry after a crash between the ballot
        // insert and the marker update lands here and must still
        // converge on a marked voter.
        voters
            .update_one(
                token.id.as_doc(),
                doc! { "$addToSet": { "voted_elections": election_id } },
                None,
            )
            .await?;
        return Err(Error::AlreadyVoted {
            voter_id: token.id,
            election_id,
        });
    }

    let candidate_id = request.0.candidate_id;
    let candidate = candidates
        .find_one(
            doc! { "_id": candidate_id, "election_id": election_id },
            None,
        )
        .await?
        .ok_or(Error::CandidateNotFound {
            candidate_id,
            election_id,
        })?;

    let voter = common::voter_by_token(&token, &voters).await?;
    if !election.eligibility.is_eligible(&voter.profile) {
        return Err(Error::unauthorized(format!(
            "Voter does not meet the eligibility criteria of election '{election_id}'"
        )));
    }
    // Candidates do not get a ballot in the election they stand in, which
    // also rules out self-voting.
    let standing = candidates
        .find_one(
            doc! { "voter_id": voter.id, "election_id": election_id },
            None,
        )
        .await?;
    if standing.is_some() {
        return Err(Error::unauthorized(format!(
            "Candidates may not vote in election '{election_id}'"
        )));
    }

    // The ballot itself is the single source of truth; the unique index
    // rejects a concurrent double cast, and everything downstream (tally,
    // has-voted) is derived by reading ballots back. No counter to keep
    // in step, so no transaction needed here.
    let vote = VoteCore::new(voter.id, candidate.id, election_id);
    match new_votes.insert_one(&vote, None).await {
        Ok(_) => {}
        Err(err) if is_duplicate_key_error(&err) => {
            // Same crash-retry healing as the fast path above.
            voters
                .update_one(
                    voter.id.as_doc(),
                    doc! { "$addToSet": { "voted_elections": election_id } },
                    None,
                )
                .await?;
            return Err(Error::AlreadyVoted {
                voter_id: voter.id,
                election_id,
            });
        }
        Err(err) => return Err(err.into()),
    }
    reap_orphan_ballot(&vote, &elections, &votes).await?;
    // Denormalised marker for profile rendering; idempotent.
    voters
        .update_one(
            voter.id.as_doc(),
            doc! { "$addToSet": { "voted_elections": election_id } },
            None,
        )
        .await?;
    Ok(())
}

/// A cascade delete that commits between the window check and the ballot
/// insert has already run its vote sweep, so it never saw this ballot.
/// Detect that case, remove the ballot again, and surface the deletion.
async fn reap_orphan_ballot(
    vote: &VoteCore,
    elections: &Coll<Election>,
    votes: &Coll<Vote>,
) -> Result<()> {
    if elections
        .find_one(vote.election_id.as_doc(), None)
        .await?
        .is_some()
    {
        return Ok(());
    }
    warn!(
        "Election {} was deleted mid-cast, removing the orphaned ballot of voter {}",
        vote.election_id, vote.voter_id
    );
    votes
        .delete_one(
            doc! { "voter_id": vote.voter_id, "election_id": vote.election_id },
            None,
        )
        .await?;
    Err(Error::not_found(format!(
        "Election with ID '{}'",
        vote.election_id
    )))
}

/// Has the authenticated voter already cast a ballot in this election?
#[get("/elections/<election_id>/vote-status")]
async fn vote_status(
    token: AuthToken<Voter>,
    election_id: Id,
    votes: Coll<Vote>,
) -> Result<Json<bool>> {
    let prior = votes
        .find_one(
            doc! { "voter_id": token.id, "election_id": election_id },
            None,
        )
        .await?;
    Ok(Json(prior.is_some()))
}

#[cfg(test)]
mod tests {
    use backend_test::backend_test;
    use mongodb::Database;
    use rocket::{
        futures::future::join_all,
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json,
    };

    use crate::api::common::tests::voter_header;
    use crate::model::db::{
        candidate::CandidateCore,
        election::{ElectionCore, NewElection},
        voter::{VoterCore, NewVoter},
    };

    use super::*;

    async fn insert_election(db: &Database, election: ElectionCore) -> Id {
        Coll::<NewElection>::from_db(db)
            .insert_one(election, None)
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into()
    }

    async fn insert_voter(db: &Database, voter: NewVoter) -> Voter {
        let voter = Voter {
            id: Id::new(),
            voter,
        };
        Coll::<Voter>::from_db(db)
            .insert_one(&voter, None)
            .await
            .unwrap();
        voter
    }

    /// Register the given voter as a candidate directly in the database,
    /// keeping the election's registration-order array in step.
    async fn insert_candidate(db: &Database, voter: &Voter, election_id: Id) -> Id {
        let candidate_id: Id = Coll::<CandidateCore>::from_db(db)
            .insert_one(
                CandidateCore::new(voter, election_id, "A manifesto".to_string()),
                None,
            )
            .await
            .unwrap()
            .inserted_id
            .as_object_id()
            .unwrap()
            .into();
        Coll::<Election>::from_db(db)
            .update_one(
                election_id.as_doc(),
                doc! { "$push": { "candidates": candidate_id } },
                None,
            )
            .await
            .unwrap();
        candidate_id
    }

    fn vote_body(candidate_id: Id) -> String {
        serde_json::to_string(&VoteRequest { candidate_id }).unwrap()
    }

    #[backend_test]
    async fn cast_vote(client: Client, db: Database, votes: Coll<Vote>) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let candidate = insert_voter(&db, VoterCore::example("Alice")).await;
        let candidate_id = insert_candidate(&db, &candidate, election_id).await;
        let voter = insert_voter(&db, VoterCore::example("Bob")).await;

        let response = client
            .post(uri!(cast_vote(election_id)))
            .header(voter_header(&client, voter.id))
            .header(ContentType::JSON)
            .body(vote_body(candidate_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let ballot = votes
            .find_one(
                doc! { "voter_id": voter.id, "election_id": election_id },
                None,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ballot.candidate_id, candidate_id);

        let voter = Coll::<Voter>::from_db(&db)
            .find_one(voter.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(voter.voted_elections.contains(&election_id));

        let response = client
            .get(uri!(vote_status(election_id)))
            .header(voter_header(&client, voter.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let voted: bool = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(voted);
    }

    #[backend_test]
    async fn one_ballot_per_voter(client: Client, db: Database, votes: Coll<Vote>) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let candidate = insert_voter(&db, VoterCore::example("Alice")).await;
        let candidate_id = insert_candidate(&db, &candidate, election_id).await;
        let voter = insert_voter(&db, VoterCore::example("Bob")).await;

        for expected in [Status::Ok, Status::Conflict] {
            let response = client
                .post(uri!(cast_vote(election_id)))
                .header(voter_header(&client, voter.id))
                .header(ContentType::JSON)
                .body(vote_body(candidate_id))
                .dispatch()
                .await;
            assert_eq!(response.status(), expected);
        }

        let count = votes
            .count_documents(
                doc! { "voter_id": voter.id, "election_id": election_id },
                None,
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[backend_test]
    async fn concurrent_double_cast_yields_one_ballot(
        client: Client,
        db: Database,
        votes: Coll<Vote>,
    ) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let candidate = insert_voter(&db, VoterCore::example("Alice")).await;
        let candidate_id = insert_candidate(&db, &candidate, election_id).await;
        let voter = insert_voter(&db, VoterCore::example("Bob")).await;

        const ATTEMPTS: usize = 8;
        let requests = (0..ATTEMPTS).map(|_| {
            client
                .post(uri!(cast_vote(election_id)))
                .header(voter_header(&client, voter.id))
                .header(ContentType::JSON)
                .body(vote_body(candidate_id))
                .dispatch()
        });
        let responses = join_all(requests).await;

        let successes = responses
            .iter()
            .filter(|response| response.status() == Status::Ok)
            .count();
        let conflicts = responses
            .iter()
            .filter(|response| response.status() == Status::Conflict)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, ATTEMPTS - 1);

        let count = votes
            .count_documents(
                doc! { "voter_id": voter.id, "election_id": election_id },
                None,
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[backend_test]
    async fn ballot_for_deleted_election_is_reaped(_client: Client, db: Database, votes: Coll<Vote>) {
        // A ballot whose election a cascade delete removed mid-cast.
        let election_id = Id::new();
        let vote = VoteCore::new(Id::new(), Id::new(), election_id);
        Coll::<NewVote>::from_db(&db)
            .insert_one(&vote, None)
            .await
            .unwrap();

        let elections = Coll::<Election>::from_db(&db);
        let result = reap_orphan_ballot(&vote, &elections, &votes).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let count = votes
            .count_documents(doc! { "election_id": election_id }, None)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[backend_test]
    async fn surviving_election_keeps_its_ballot(_client: Client, db: Database, votes: Coll<Vote>) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let vote = VoteCore::new(Id::new(), Id::new(), election_id);
        Coll::<NewVote>::from_db(&db)
            .insert_one(&vote, None)
            .await
            .unwrap();

        let elections = Coll::<Election>::from_db(&db);
        assert!(reap_orphan_ballot(&vote, &elections, &votes).await.is_ok());

        let count = votes
            .count_documents(doc! { "election_id": election_id }, None)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[backend_test]
    async fn retry_after_crash_heals_the_marker(client: Client, db: Database) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let candidate = insert_voter(&db, VoterCore::example("Alice")).await;
        let candidate_id = insert_candidate(&db, &candidate, election_id).await;
        let voter = insert_voter(&db, VoterCore::example("Bob")).await;

        // A ballot that landed without its marker (crash before the
        // voted_elections update).
        Coll::<NewVote>::from_db(&db)
            .insert_one(VoteCore::new(voter.id, candidate_id, election_id), None)
            .await
            .unwrap();

        let response = client
            .post(uri!(cast_vote(election_id)))
            .header(voter_header(&client, voter.id))
            .header(ContentType::JSON)
            .body(vote_body(candidate_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);

        let voter = Coll::<Voter>::from_db(&db)
            .find_one(voter.id.as_doc(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(voter.voted_elections.contains(&election_id));
    }

    #[backend_test]
    async fn vote_status_false_before_casting(client: Client, db: Database) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let voter = insert_voter(&db, VoterCore::example("Bob")).await;

        let response = client
            .get(uri!(vote_status(election_id)))
            .header(voter_header(&client, voter.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let voted: bool = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(!voted);
    }

    #[backend_test]
    async fn no_ballots_outside_the_window(client: Client, db: Database) {
        let voter = insert_voter(&db, VoterCore::example("Bob")).await;
        for election in [
            ElectionCore::example_future(Id::new()),
            ElectionCore::example_ended(Id::new()),
        ] {
            let election_id = insert_election(&db, election).await;
            let response = client
                .post(uri!(cast_vote(election_id)))
                .header(voter_header(&client, voter.id))
                .header(ContentType::JSON)
                .body(vote_body(Id::new()))
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest);
        }
    }

    #[backend_test]
    async fn unknown_candidate_rejected(client: Client, db: Database) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let voter = insert_voter(&db, VoterCore::example("Bob")).await;

        let response = client
            .post(uri!(cast_vote(election_id)))
            .header(voter_header(&client, voter.id))
            .header(ContentType::JSON)
            .body(vote_body(Id::new()))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[backend_test]
    async fn candidates_cannot_vote_in_their_election(client: Client, db: Database) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let alice = insert_voter(&db, VoterCore::example("Alice")).await;
        let alice_candidacy = insert_candidate(&db, &alice, election_id).await;
        let bob = insert_voter(&db, VoterCore::example("Bob")).await;
        let bob_candidacy = insert_candidate(&db, &bob, election_id).await;

        // Not for themselves, and not for anyone else either.
        for target in [alice_candidacy, bob_candidacy] {
            let response = client
                .post(uri!(cast_vote(election_id)))
                .header(voter_header(&client, alice.id))
                .header(ContentType::JSON)
                .body(vote_body(target))
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Forbidden);
        }
    }

    #[backend_test]
    async fn ineligible_voter_cannot_vote(client: Client, db: Database) {
        let election_id = insert_election(&db, ElectionCore::example_open(Id::new())).await;
        let candidate = insert_voter(&db, VoterCore::example("Alice")).await;
        let candidate_id = insert_candidate(&db, &candidate, election_id).await;
        let eve = insert_voter(&db, VoterCore::example_other_university("Eve")).await;

        let response = client
            .post(uri!(cast_vote(election_id)))
            .header(voter_header(&client, eve.id))
            .header(ContentType::JSON)
            .body(vote_body(candidate_id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }
}
