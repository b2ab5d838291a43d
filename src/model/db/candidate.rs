use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, Position};

/// Core candidate data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    /// Display name.
    pub name: String,
    /// The position this candidate contests.
    pub position: Position,
    /// Optional blurb shown on the ballot.
    pub description: Option<String>,
    /// Materialised tally: always equals the number of ballots referencing
    /// this candidate. Mutated only inside the vote-recording transaction.
    pub vote_count: u64,
}

/// A candidate from the database, with their unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Candidate {
        pub fn example(id: CandidateId, name: &str, position: &str) -> Self {
            Self {
                id,
                candidate: CandidateCore {
                    name: name.to_string(),
                    position: position.to_string(),
                    description: None,
                    vote_count: 0,
                },
            }
        }
    }
}
