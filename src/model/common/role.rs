use serde::{Deserialize, Serialize};

/// Account roles. Only voters cast ballots; admins watch the tallies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Voter,
    Admin,
}
