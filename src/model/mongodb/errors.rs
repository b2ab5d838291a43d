//! For some reason, the mongodb crate doesn't provide error code constants.
//! This module fills in the gaps.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given error is a unique-index rejection of a duplicate
/// insert. Inside a transaction the server may report it as a command error
/// rather than a write error, so check both.
pub fn is_duplicate_key(err: &DbError) -> bool {
    match *err.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref write_err)) => {
            write_err.code == DUPLICATE_KEY
        }
        ErrorKind::Command(ref command_err) => command_err.code == DUPLICATE_KEY,
        _ => false,
    }
}
