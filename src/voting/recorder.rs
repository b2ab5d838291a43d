use std::collections::HashSet;

use mongodb::{bson::doc, Client, ClientSession, Database};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateId, Position, VoterId},
    db::{Ballot, Candidate, Voter},
    mongodb::{is_duplicate_key, u32_id_filter, Coll},
};

use super::{PositionCatalog, VoteError};

/// Records votes.
///
/// Owns its store handles; every cast runs as a single transaction against
/// them, so a vote either commits in full (ballot, tally, completion flag)
/// or leaves no trace.
pub struct VoteRecorder {
    client: Client,
    voters: Coll<Voter>,
    candidates: Coll<Candidate>,
    ballots: Coll<Ballot>,
    catalog: PositionCatalog,
}

/// The committed outcome of a successful cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    /// The position the ballot counted towards.
    pub position: Position,
    /// Every position this voter now holds a ballot for.
    pub voted_positions: Vec<Position>,
    /// Updated completion state: true once every catalog position is covered.
    pub has_voted: bool,
}

impl VoteRecorder {
    pub fn new(client: Client, db: &Database, catalog: PositionCatalog) -> Self {
        Self {
            client,
            voters: Coll::from_db(db),
            candidates: Coll::from_db(db),
            ballots: Coll::from_db(db),
            catalog,
        }
    }

    /// Atomically decide-and-commit a single vote by `voter_id` for
    /// `candidate_id`, against whatever position that candidate contests.
    ///
    /// May block while the store serialises conflicting transactions. On any
    /// failure the transaction is rolled back in full; a
    /// [`VoteError::Store`] failure is therefore safe to retry.
    pub async fn cast_vote(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
    ) -> Result<VoteReceipt, VoteError> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        match self.record(voter_id, candidate_id, &mut session).await {
            Ok(receipt) => {
                session.commit_transaction().await?;
                info!(
                    "Vote recorded: voter {voter_id} chose candidate {candidate_id} for {}",
                    receipt.position
                );
                Ok(receipt)
            }
            Err(err) => {
                // A failed cast must leave nothing behind.
                if let Err(abort_err) = session.abort_transaction().await {
                    warn!("Failed to abort vote transaction: {abort_err}");
                }
                Err(err)
            }
        }
    }

    /// The body of the vote transaction. Every read and write goes through
    /// `session`; the caller commits or aborts.
    async fn record(
        &self,
        voter_id: VoterId,
        candidate_id: CandidateId,
        session: &mut ClientSession,
    ) -> Result<VoteReceipt, VoteError> {
        // Both records may have been deleted since request validation, so
        // look them up again inside the transaction.
        let voter = self
            .voters
            .find_one_with_session(u32_id_filter(voter_id), None, session)
            .await?
            .ok_or(VoteError::VoterNotFound(voter_id))?;
        let candidate = self
            .candidates
            .find_one_with_session(u32_id_filter(candidate_id), None, session)
            .await?
            .ok_or(VoteError::CandidateNotFound(candidate_id))?;
        let position = candidate.position.clone();

        // Advisory duplicate check: catches the common case before we write
        // anything. The unique `(voter_id, position)` index remains the
        // authoritative guard.
        let already_cast = self
            .ballots
            .find_one_with_session(
                doc! { "voter_id": voter_id, "position": &position },
                None,
                session,
            )
            .await?;
        if already_cast.is_some() {
            return Err(VoteError::AlreadyVoted(position));
        }

        // When two casts race past the check above, the index rejecting the
        // second insert is the "already voted" signal.
        let ballot = Ballot::new(voter_id, &candidate);
        if let Err(err) = self
            .ballots
            .insert_one_with_session(&ballot, None, session)
            .await
        {
            return Err(if is_duplicate_key(&err) {
                VoteError::AlreadyVoted(position)
            } else {
                err.into()
            });
        }

        self.candidates
            .update_one_with_session(
                u32_id_filter(candidate_id),
                doc! { "$inc": { "vote_count": 1 } },
                None,
                session,
            )
            .await?;

        // Recompute the completion flag from the ballots themselves.
        let voted = self
            .ballots
            .distinct_with_session("position", doc! { "voter_id": voter_id }, None, session)
            .await?
            .iter()
            .filter_map(|value| value.as_str().map(String::from))
            .collect::<HashSet<_>>();
        let has_voted = self.catalog.covered_by(&voted);
        if has_voted && !voter.has_voted {
            self.voters
                .update_one_with_session(
                    u32_id_filter(voter_id),
                    doc! { "$set": { "has_voted": true } },
                    None,
                    session,
                )
                .await?;
        }

        Ok(VoteReceipt {
            voted_positions: self.catalog.order(voted),
            position,
            has_voted,
        })
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for VoteRecorder {
    type Error = ();

    /// Assemble a recorder from the managed client, database, and catalog.
    ///
    /// Panics iff any of those are not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let client = req.guard::<&State<Client>>().await.unwrap().inner().clone();
        let db = req.guard::<&State<Database>>().await.unwrap();
        let catalog = req
            .guard::<&State<PositionCatalog>>()
            .await
            .unwrap()
            .inner()
            .clone();
        request::Outcome::Success(Self::new(client, db, catalog))
    }
}
