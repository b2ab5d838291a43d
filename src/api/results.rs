use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, Position},
    db::Candidate,
    mongodb::Coll,
};
use crate::voting::PositionCatalog;

pub fn routes() -> Vec<Route> {
    routes![positions, candidates, candidates_for_position]
}

/// A candidate and their running tally, as shown on the results board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CandidateSummary {
    pub id: CandidateId,
    pub name: String,
    pub position: Position,
    pub description: Option<String>,
    pub vote_count: u64,
}

impl From<Candidate> for CandidateSummary {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.candidate.name,
            position: candidate.candidate.position,
            description: candidate.candidate.description,
            vote_count: candidate.candidate.vote_count,
        }
    }
}

/// The position catalog for the current election.
#[get("/positions")]
async fn positions(catalog: &State<PositionCatalog>) -> Json<Vec<Position>> {
    Json(catalog.positions().to_vec())
}

/// All candidates with their tallies, highest first.
#[get("/candidates")]
async fn candidates(candidates: Coll<Candidate>) -> Result<Json<Vec<CandidateSummary>>> {
    let by_votes = FindOptions::builder().sort(doc! { "vote_count": -1 }).build();
    let all = candidates
        .find(None, by_votes)
        .await?
        .map_ok(CandidateSummary::from)
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(all))
}

/// The candidates contesting a single position, highest tally first.
#[get("/positions/<position>/candidates")]
async fn candidates_for_position(
    position: String,
    candidates: Coll<Candidate>,
    catalog: &State<PositionCatalog>,
) -> Result<Json<Vec<CandidateSummary>>> {
    if !catalog.positions().contains(&position) {
        return Err(Error::not_found(format!("Position '{position}'")));
    }

    let by_votes = FindOptions::builder().sort(doc! { "vote_count": -1 }).build();
    let matching = candidates
        .find(doc! { "position": &position }, by_votes)
        .await?
        .map_ok(CandidateSummary::from)
        .try_collect::<Vec<_>>()
        .await?;
    Ok(Json(matching))
}

#[cfg(test)]
mod tests {
    use mongodb::Database;
    use rocket::{http::Status, local::asynchronous::Client, serde::json::serde_json};

    use crate::model::{db::Candidate, mongodb::Coll};

    use super::*;

    async fn insert_candidates(db: &Database) {
        let mut alice = Candidate::example(10, "Alice Aldermann", "President");
        alice.vote_count = 2;
        let mut bob = Candidate::example(11, "Bob Babbage", "President");
        bob.vote_count = 5;
        let mut carol = Candidate::example(20, "Carol Cantor", "Secretary");
        carol.vote_count = 3;

        Coll::<Candidate>::from_db(db)
            .insert_many([alice, bob, carol], None)
            .await
            .unwrap();
    }

    async fn fetch(client: &Client, uri: rocket::http::uri::Origin<'_>) -> Vec<CandidateSummary> {
        let response = client.get(uri).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[backend_test]
    async fn positions_lists_the_catalog(client: Client) {
        let response = client.get(uri!(positions)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let fetched: Vec<String> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let expected = crate::TEST_POSITIONS
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        assert_eq!(expected, fetched);
    }

    #[backend_test]
    async fn candidates_are_listed_by_tally(client: Client, db: Database) {
        insert_candidates(&db).await;

        let fetched = fetch(&client, uri!(candidates)).await;
        let names = fetched.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            vec!["Bob Babbage", "Carol Cantor", "Alice Aldermann"],
            names
        );
    }

    #[backend_test]
    async fn candidates_for_position_filters_and_sorts(client: Client, db: Database) {
        insert_candidates(&db).await;

        let fetched = fetch(&client, uri!(candidates_for_position("President"))).await;
        let names = fetched.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(vec!["Bob Babbage", "Alice Aldermann"], names);
    }

    #[backend_test]
    async fn unknown_position_is_not_found(client: Client) {
        let response = client
            .get(uri!(candidates_for_position("Archivist")))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }
}
