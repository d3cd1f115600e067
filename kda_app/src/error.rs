use std::sync::{MutexGuard, PoisonError};

use kda_common::PathError;

use crate::apdu::StatusWord;
use crate::command::Status;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed derivation path: {0}")]
    MalformedPath(#[from] PathError),

    #[error("Rejected by user")]
    UserRejected,

    #[error("Review cancelled before a decision was taken")]
    Cancelled,

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Invalid APDU, answering {0:?}")]
    InvalidApdu(StatusWord),

    #[error("A review flow must end with exactly one confirm screen")]
    InvalidReviewFlow,

    #[error("Device answered {0:?}")]
    Device(StatusWord),

    #[error("Invalid answer from device: {0}")]
    InvalidAnswer(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Poison error: {0}")]
    PoisonError(String),
}

impl Error {
    /// The outcome reported to the host when this error ends a command
    pub fn status(&self) -> Status {
        match self {
            Error::MalformedPath(_) => Status::MalformedPath,
            Error::UserRejected => Status::UserRejected,
            Error::Cancelled => Status::Cancelled,
            _ => Status::InternalError,
        }
    }
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(e: PoisonError<MutexGuard<'_, T>>) -> Self {
        Error::PoisonError(e.to_string())
    }
}
