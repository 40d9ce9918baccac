use mongodb::{bson::doc, options::FindOptions, Client};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::election::{ElectionDescription, ElectionSpec, ElectionSummary},
    auth::{Admin, AnyToken, AuthToken},
    db::{
        candidate::Candidate,
        election::{Election, NewElection},
        result::ElectionResult,
        vote::Vote,
        voter::Voter,
    },
    mongodb::{Coll, Id},
};

use super::common;

pub fn routes() -> Vec<Route> {
    routes![
        create_election,
        list_elections,
        get_election,
        delete_election
    ]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    token: AuthToken<Admin>,
    spec: Json<ElectionSpec>,
    new_elections: Coll<NewElection>,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    spec.validate()?;

    let election = spec.0.into_new_election(token.id);
    let new_id: Id = new_elections
        .insert_one(&election, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Safe because we just inserted with an ObjectId `_id`.
        .into();

    let election = common::election_by_id(new_id, &elections).await?;
    Ok(Json(election.into()))
}

#[get("/elections")]
async fn list_elections(
    _token: AnyToken,
    elections: Coll<Election>,
) -> Result<Json<Vec<ElectionSummary>>> {
    // Most recently starting first.
    let options = FindOptions::builder()
        .sort(doc! { "start_date": -1 })
        .build();
    let elections: Vec<Election> = elections.find(None, options).await?.try_collect().await?;
    Ok(Json(elections.into_iter().map(Into::into).collect()))
}

#[get("/elections/<election_id>")]
async fn get_election(
    _token: AnyToken,
    election_id: Id,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let election = common::election_by_id(election_id, &elections).await?;
    Ok(Json(election.into()))
}

#[delete("/elections/<election_id>")]
async fn delete_election(
    token: AuthToken<Admin>,
    election_id: Id,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
    results: Coll<ElectionResult>,
    voters: Coll<Voter>,
    db_client: &State<Client>,
) -> Result<()> {
    let election = common::election_by_id(election_id, &elections).await?;
    if election.created_by != token.id {
        return Err(Error::unauthorized(format!(
            "Only the creating admin may delete election '{election_id}'"
        )));
    }

    // All-or-nothing cascade: the election either disappears with every
    // dependent record, or nothing changes.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let by_election = doc! { "election_id": election_id };
    votes
        .delete_many_with_session(by_election.clone(), None, &mut session)
        .await?;
    candidates
        .delete_many_with_session(by_election.clone(), None, &mut session)
        .await?;
    results
        .delete_many_with_session(by_election, None, &mut session)
        .await?;
    // Drop the denormalised references from voter profiles.
    voters
        .update_many_with_session(
            doc! {},
            doc! { "$pull": { "candidacies": election_id, "voted_elections": election_id } },
            None,
            &mut session,
        )
        .await?;
    elections
        .delete_one_with_session(election_id.as_doc(), None, &mut session)
        .await?;

    session.commit_transaction().await?;
    Ok(())
}
