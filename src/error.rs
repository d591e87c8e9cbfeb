use std::fmt;

use thiserror::Error;

use crate::github::{RemoteError, RemoteOp};
use crate::types::{Role, UnknownRole};

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("{0} not found")]
    Missing(Entity),

    #[error("already exists")]
    AlreadyExists,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("not a repository url: {0}")]
    InvalidRepositoryUrl(String),

    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    #[error("cannot move role from {from} to {to}")]
    InvalidStateTransition { from: Role, to: Role },

    #[error("{op} failed: {source}")]
    Remote {
        op: RemoteOp,
        #[source]
        source: RemoteError,
    },
}

/// Domain entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Exporter,
    Bucket,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::User => "user",
            Entity::Exporter => "exporter",
            Entity::Bucket => "bucket entry",
        })
    }
}

impl Error {
    pub fn remote(op: RemoteOp) -> impl FnOnce(RemoteError) -> Error {
        move |source| Error::Remote { op, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
