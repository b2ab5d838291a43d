//! The vote-recording core: the position catalog, the transactional vote
//! recorder, and the read-only status projection.

mod catalog;
mod recorder;
mod status;

pub use catalog::{CatalogFairing, PositionCatalog};
pub use recorder::{VoteReceipt, VoteRecorder};
pub use status::{StatusReader, VotingProgress};

use thiserror::Error;

use crate::model::common::{CandidateId, Position, VoterId};

/// Why a cast was rejected or failed. Every variant leaves the store
/// untouched: the transaction is rolled back before it is returned.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("No voter found with ID {0}")]
    VoterNotFound(VoterId),
    #[error("No candidate found with ID {0}")]
    CandidateNotFound(CandidateId),
    /// Not a fault, merely a rejected state transition: the voter already
    /// holds a ballot for this position.
    #[error("A ballot for {0} has already been cast")]
    AlreadyVoted(Position),
    /// The transaction could not be started or committed. Transient; nothing
    /// was written, so the whole cast is safe to retry.
    #[error("Ballot store unavailable: {0}")]
    Store(#[from] mongodb::error::Error),
}
