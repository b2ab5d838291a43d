use std::collections::HashSet;

use mongodb::{error::Error as DbError, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};

use crate::config::Config;
use crate::model::{common::Position, db::Candidate, mongodb::Coll};

/// The set of positions in play for the current election.
///
/// Resolved once at ignition and immutable afterwards, so the recorder and
/// the status reader agree on what "all positions" means for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCatalog {
    positions: Vec<Position>,
}

impl PositionCatalog {
    /// Build a catalog from a fixed list, deduplicating while preserving
    /// order.
    pub fn fixed(names: impl IntoIterator<Item = Position>) -> Self {
        let mut positions = Vec::new();
        for name in names {
            if !positions.contains(&name) {
                positions.push(name);
            }
        }
        Self { positions }
    }

    /// Derive the catalog from the distinct positions contested by the
    /// current candidates.
    pub async fn derive(candidates: &Coll<Candidate>) -> Result<Self, DbError> {
        let mut positions = candidates
            .distinct("position", None, None)
            .await?
            .iter()
            .filter_map(|value| value.as_str().map(String::from))
            .collect::<Vec<_>>();
        positions.sort();
        Ok(Self { positions })
    }

    /// The catalog positions, in catalog order.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True iff every catalog position appears in `voted`.
    pub fn covered_by(&self, voted: &HashSet<Position>) -> bool {
        self.positions
            .iter()
            .all(|position| voted.contains(position))
    }

    /// List `voted` with catalog positions first, in catalog order; any
    /// position no longer in the catalog follows, sorted.
    pub fn order(&self, voted: HashSet<Position>) -> Vec<Position> {
        let mut ordered = self
            .positions
            .iter()
            .filter(|position| voted.contains(*position))
            .cloned()
            .collect::<Vec<_>>();
        let mut off_catalog = voted
            .into_iter()
            .filter(|position| !self.positions.contains(position))
            .collect::<Vec<_>>();
        off_catalog.sort();
        ordered.extend(off_catalog);
        ordered
    }
}

/// A fairing that resolves the position catalog once the config and database
/// are available, and puts it in managed state.
pub struct CatalogFairing;

#[rocket::async_trait]
impl Fairing for CatalogFairing {
    fn info(&self) -> Info {
        Info {
            name: "Position catalog",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let fixed = rocket
            .state::<Config>()
            .and_then(Config::positions)
            .map(|names| PositionCatalog::fixed(names.to_vec()));

        let catalog = match fixed {
            Some(catalog) => catalog,
            None => {
                let db = match rocket.state::<Database>() {
                    Some(db) => db,
                    None => {
                        error!("Cannot derive the position catalog without a database");
                        return Err(rocket);
                    }
                };
                match PositionCatalog::derive(&Coll::from_db(db)).await {
                    Ok(catalog) => catalog,
                    Err(e) => {
                        error!("Failed to derive the position catalog: {e}");
                        return Err(rocket);
                    }
                }
            }
        };

        if catalog.is_empty() {
            warn!("The position catalog is empty; no ballots can be cast");
        } else {
            info!("Position catalog: {}", catalog.positions().join(", "));
        }

        Ok(rocket.manage(catalog))
    }
}
