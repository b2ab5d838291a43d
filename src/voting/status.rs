use std::collections::HashSet;

use mongodb::{bson::doc, error::Error as DbError, Database};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{Position, VoterId},
    db::Ballot,
    mongodb::Coll,
};

use super::PositionCatalog;

/// Read-only projection of a voter's progress through the catalog.
///
/// Reads observe only committed ballots; nothing here ever writes.
pub struct StatusReader {
    ballots: Coll<Ballot>,
    catalog: PositionCatalog,
}

impl StatusReader {
    pub fn new(db: &Database, catalog: PositionCatalog) -> Self {
        Self {
            ballots: Coll::from_db(db),
            catalog,
        }
    }

    /// The distinct positions this voter holds committed ballots for.
    pub async fn voted_positions(&self, voter_id: VoterId) -> Result<Vec<Position>, DbError> {
        let voted = self
            .ballots
            .distinct("position", doc! { "voter_id": voter_id }, None)
            .await?
            .iter()
            .filter_map(|value| value.as_str().map(String::from))
            .collect::<HashSet<_>>();
        Ok(self.catalog.order(voted))
    }

    /// How far through the catalog this voter is.
    pub async fn progress(&self, voter_id: VoterId) -> Result<VotingProgress, DbError> {
        let voted = self.voted_positions(voter_id).await?;
        Ok(VotingProgress::derive(&self.catalog, &voted))
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for StatusReader {
    type Error = ();

    /// Assemble a reader from the managed database and catalog.
    ///
    /// Panics iff either is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        let catalog = req
            .guard::<&State<PositionCatalog>>()
            .await
            .unwrap()
            .inner()
            .clone();
        request::Outcome::Success(Self::new(db, catalog))
    }
}

/// A voter's progress through the catalog. Pure derivation from the voted
/// positions and the catalog; no state of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingProgress {
    pub voted_count: usize,
    pub total_count: usize,
    pub remaining_positions: Vec<Position>,
}

impl VotingProgress {
    pub fn derive(catalog: &PositionCatalog, voted: &[Position]) -> Self {
        let remaining_positions = catalog
            .positions()
            .iter()
            .filter(|position| !voted.contains(*position))
            .cloned()
            .collect::<Vec<_>>();
        Self {
            voted_count: catalog.len() - remaining_positions.len(),
            total_count: catalog.len(),
            remaining_positions,
        }
    }
}
