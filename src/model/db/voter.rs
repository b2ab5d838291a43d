use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::{Role, VoterId};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Display name.
    pub name: String,
    /// Opaque hashed credential. Verified by the sign-in layer, never here.
    pub credential: String,
    /// Account role.
    pub role: Role,
    /// True once the voter holds a ballot for every position in the catalog.
    /// Always recomputable from the ballots; stored for fast reads.
    pub has_voted: bool,
}

/// A voter from the database, with their unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Voter {
        pub fn example(id: VoterId) -> Self {
            Self {
                id,
                voter: VoterCore {
                    name: format!("Voter {id}"),
                    credential: "opaque-credential-hash".to_string(),
                    role: Role::Voter,
                    has_voted: false,
                },
            }
        }
    }
}
