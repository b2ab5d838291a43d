use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateId, Position, VoterId},
    db::Candidate,
    mongodb::Id,
};

/// Core ballot data, as stored in the database.
///
/// Ballots are write-once: nothing ever updates or deletes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotCore {
    /// Foreign key voter ID.
    pub voter_id: VoterId,
    /// Foreign key candidate ID.
    pub candidate_id: CandidateId,
    /// The contested position, copied from the candidate at write time so
    /// the unique `(voter_id, position)` index can see it.
    pub position: Position,
    /// When the ballot was cast.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

/// A ballot from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "_id")]
    pub id: Id,
    /// Ballot contents.
    #[serde(flatten)]
    pub ballot: BallotCore,
}

impl Ballot {
    /// Create a new ballot for the given voter and candidate.
    pub fn new(voter_id: VoterId, candidate: &Candidate) -> Self {
        Self {
            id: Id::new(),
            ballot: BallotCore {
                voter_id,
                candidate_id: candidate.id,
                position: candidate.position.clone(),
                cast_at: Utc::now(),
            },
        }
    }
}

impl Deref for Ballot {
    type Target = BallotCore;

    fn deref(&self) -> &Self::Target {
        &self.ballot
    }
}
