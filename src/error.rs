use rocket::{
    http::{Status, StatusClass},
    response::Responder,
};
use thiserror::Error;

use crate::voting::VoteError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Vote(#[from] VoteError),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = match &self {
            Self::Db(_) => Status::InternalServerError,
            Self::Vote(err) => match err {
                VoteError::VoterNotFound(_) | VoteError::CandidateNotFound(_) => Status::NotFound,
                VoteError::AlreadyVoted(_) => Status::Conflict,
                VoteError::Store(_) => Status::ServiceUnavailable,
            },
            Self::NotFound(_) => Status::NotFound,
        };
        if status.class() == StatusClass::ServerError {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        Err(status)
    }
}
