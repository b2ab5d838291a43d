use rocket::{serde::json::Json, Route};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::common::{CandidateId, Position, VoterId};
use crate::voting::{StatusReader, VoteReceipt, VoteRecorder, VotingProgress};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, voted_positions, voting_progress]
}

/// A vote the caller wishes to cast: one voter choosing one candidate for
/// whatever position that candidate contests.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
struct VoteSpec {
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
}

#[post("/votes", data = "<vote>", format = "json")]
async fn cast_vote(vote: Json<VoteSpec>, recorder: VoteRecorder) -> Result<Json<VoteReceipt>> {
    let receipt = recorder.cast_vote(vote.voter_id, vote.candidate_id).await?;
    Ok(Json(receipt))
}

#[get("/voters/<voter_id>/positions")]
async fn voted_positions(voter_id: VoterId, reader: StatusReader) -> Result<Json<Vec<Position>>> {
    Ok(Json(reader.voted_positions(voter_id).await?))
}

#[get("/voters/<voter_id>/progress")]
async fn voting_progress(voter_id: VoterId, reader: StatusReader) -> Result<Json<VotingProgress>> {
    Ok(Json(reader.progress(voter_id).await?))
}

#[cfg(test)]
mod tests {
    use mongodb::{bson::doc, Database};
    use rocket::{
        futures::TryStreamExt,
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json,
        tokio,
    };

    use crate::model::{
        db::{Ballot, Candidate, Voter},
        mongodb::{u32_id_filter, Coll},
    };

    use super::*;

    /// Voters 1 and 2; candidates 10/11 contest President, 20/21 Secretary,
    /// 30 Vice President, 40 Treasurer.
    async fn insert_fixtures(db: &Database) {
        Coll::<Voter>::from_db(db)
            .insert_many([Voter::example(1), Voter::example(2)], None)
            .await
            .unwrap();

        Coll::<Candidate>::from_db(db)
            .insert_many(
                [
                    Candidate::example(10, "Alice Aldermann", "President"),
                    Candidate::example(11, "Bob Babbage", "President"),
                    Candidate::example(20, "Carol Cantor", "Secretary"),
                    Candidate::example(21, "Dan Dijkstra", "Secretary"),
                    Candidate::example(30, "Erin Euler", "Vice President"),
                    Candidate::example(40, "Frank Floyd", "Treasurer"),
                ],
                None,
            )
            .await
            .unwrap();
    }

    async fn cast<'c>(client: &'c Client, voter_id: u32, candidate_id: u32) -> LocalResponse<'c> {
        client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(
                serde_json::json!({ "voter_id": voter_id, "candidate_id": candidate_id })
                    .to_string(),
            )
            .dispatch()
            .await
    }

    async fn receipt(response: LocalResponse<'_>) -> VoteReceipt {
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[backend_test]
    async fn cast_vote_records_ballot_and_tally(client: Client, db: Database) {
        insert_fixtures(&db).await;

        let response = cast(&client, 1, 10).await;
        assert_eq!(Status::Ok, response.status());
        let receipt = receipt(response).await;
        assert_eq!("President", receipt.position);
        assert_eq!(vec!["President".to_string()], receipt.voted_positions);
        assert!(!receipt.has_voted);

        // The ballot and the tally were committed together.
        let candidate = Coll::<Candidate>::from_db(&db)
            .find_one(u32_id_filter(10), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(1, candidate.vote_count);
        let ballots = Coll::<Ballot>::from_db(&db);
        assert_eq!(
            1,
            ballots
                .count_documents(doc! { "voter_id": 1u32 }, None)
                .await
                .unwrap()
        );

        let response = client.get(uri!(voted_positions(1u32))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let positions: Vec<String> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(vec!["President".to_string()], positions);
    }

    #[backend_test]
    async fn repeat_vote_for_position_is_rejected(client: Client, db: Database) {
        insert_fixtures(&db).await;

        assert_eq!(Status::Ok, cast(&client, 1, 10).await.status());
        // A different candidate for the same position must not count either.
        assert_eq!(Status::Conflict, cast(&client, 1, 11).await.status());

        // The rejected cast left nothing behind.
        let candidate = Coll::<Candidate>::from_db(&db)
            .find_one(u32_id_filter(11), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(0, candidate.vote_count);
        let ballots = Coll::<Ballot>::from_db(&db);
        assert_eq!(
            1,
            ballots
                .count_documents(doc! { "voter_id": 1u32 }, None)
                .await
                .unwrap()
        );
        let voter = Coll::<Voter>::from_db(&db)
            .find_one(u32_id_filter(1), None)
            .await
            .unwrap()
            .unwrap();
        assert!(!voter.has_voted);
    }

    #[backend_test]
    async fn voting_every_position_sets_completion_flag(client: Client, db: Database) {
        insert_fixtures(&db).await;

        for candidate_id in [10u32, 20, 30] {
            let response = cast(&client, 1, candidate_id).await;
            assert_eq!(Status::Ok, response.status());
            assert!(!receipt(response).await.has_voted);
        }

        let response = cast(&client, 1, 40).await;
        assert_eq!(Status::Ok, response.status());
        let receipt = receipt(response).await;
        assert!(receipt.has_voted);
        assert_eq!(4, receipt.voted_positions.len());

        let voter = Coll::<Voter>::from_db(&db)
            .find_one(u32_id_filter(1), None)
            .await
            .unwrap()
            .unwrap();
        assert!(voter.has_voted);

        let response = client.get(uri!(voting_progress(1u32))).dispatch().await;
        let progress: VotingProgress =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(4, progress.voted_count);
        assert_eq!(4, progress.total_count);
        assert!(progress.remaining_positions.is_empty());
    }

    #[backend_test]
    async fn concurrent_casts_for_one_position_count_once(client: Client, db: Database) {
        insert_fixtures(&db).await;

        // A double submission: two candidates, both contesting Secretary.
        let (first, second) = tokio::join!(cast(&client, 1, 20), cast(&client, 1, 21));

        // A loser that hit a transient write conflict may retry the whole
        // cast; the retry must observe the committed ballot.
        let mut statuses = Vec::new();
        for (candidate_id, response) in [(20u32, first), (21u32, second)] {
            let mut status = response.status();
            if status == Status::ServiceUnavailable {
                status = cast(&client, 1, candidate_id).await.status();
            }
            statuses.push(status);
        }
        let successes = statuses.iter().filter(|s| **s == Status::Ok).count();
        let rejections = statuses.iter().filter(|s| **s == Status::Conflict).count();
        assert_eq!((1, 1), (successes, rejections));

        // Exactly one ballot, and the Secretary tallies sum to exactly one.
        let ballots = Coll::<Ballot>::from_db(&db);
        assert_eq!(
            1,
            ballots
                .count_documents(doc! { "voter_id": 1u32, "position": "Secretary" }, None)
                .await
                .unwrap()
        );
        let secretaries = Coll::<Candidate>::from_db(&db)
            .find(doc! { "position": "Secretary" }, None)
            .await
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(1u64, secretaries.iter().map(|c| c.vote_count).sum::<u64>());
    }

    #[backend_test]
    async fn vote_for_missing_candidate_is_not_found(client: Client, db: Database) {
        insert_fixtures(&db).await;

        assert_eq!(Status::NotFound, cast(&client, 1, 99).await.status());

        // Nothing was written.
        let ballots = Coll::<Ballot>::from_db(&db);
        assert_eq!(0, ballots.count_documents(None, None).await.unwrap());
    }

    #[backend_test]
    async fn vote_from_missing_voter_is_not_found(client: Client, db: Database) {
        insert_fixtures(&db).await;

        assert_eq!(Status::NotFound, cast(&client, 9, 10).await.status());

        let ballots = Coll::<Ballot>::from_db(&db);
        assert_eq!(0, ballots.count_documents(None, None).await.unwrap());
    }

    #[backend_test]
    async fn tallies_track_ballots_across_voters(client: Client, db: Database) {
        insert_fixtures(&db).await;

        assert_eq!(Status::Ok, cast(&client, 1, 10).await.status());
        assert_eq!(Status::Ok, cast(&client, 2, 10).await.status());

        let candidate = Coll::<Candidate>::from_db(&db)
            .find_one(u32_id_filter(10), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(2, candidate.vote_count);
        let ballots = Coll::<Ballot>::from_db(&db);
        assert_eq!(
            2,
            ballots
                .count_documents(doc! { "candidate_id": 10u32 }, None)
                .await
                .unwrap()
        );
    }

    #[backend_test]
    async fn fresh_voter_has_no_voted_positions(client: Client, db: Database) {
        insert_fixtures(&db).await;

        let response = client.get(uri!(voted_positions(2u32))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let positions: Vec<String> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert!(positions.is_empty());

        let response = client.get(uri!(voting_progress(2u32))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let progress: VotingProgress =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(0, progress.voted_count);
        assert_eq!(4, progress.total_count);
        assert_eq!(4, progress.remaining_positions.len());
    }
}
