//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g. IDs and
//! datetimes are stored in MongoDB's own formats.

mod ballot;
pub use ballot::{Ballot, BallotCore};

mod candidate;
pub use candidate::{Candidate, CandidateCore};

mod voter;
pub use voter::{Voter, VoterCore};
