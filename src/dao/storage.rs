use std::{error::Error, fmt};

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Game operation the engine was persisting when a backend failed.
///
/// Carried on [`StorageError`] so the chat layer can tell players and
/// operators what was being written, not just that storage broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// Opening the backend or bootstrapping its schema.
    Setup,
    /// Reading a channel's game state.
    ChannelRead,
    /// Registering a guild's game channel.
    ChannelRegistration,
    /// Checking a song against the channel's used set.
    SongLookup,
    /// Writing the effects of one answer.
    AnswerCommit,
    /// Reading a user's answer counters.
    StatsRead,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StorageOp::Setup => "storage setup",
            StorageOp::ChannelRead => "channel read",
            StorageOp::ChannelRegistration => "channel registration",
            StorageOp::SongLookup => "used-song lookup",
            StorageOp::AnswerCommit => "answer commit",
            StorageOp::StatsRead => "stats read",
        };
        f.write_str(label)
    }
}

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not complete the given game operation.
    #[error("storage unavailable during {op}: {message}")]
    Unavailable {
        /// Game operation that was in flight.
        op: StorageOp,
        /// Backend-specific description of the failure.
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(
        op: StorageOp,
        message: String,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Unavailable {
            op,
            message,
            source: Box::new(source),
        }
    }

    /// Game operation that was in flight when the backend failed.
    pub fn op(&self) -> StorageOp {
        match self {
            StorageError::Unavailable { op, .. } => *op,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_game_operation() {
        let err = StorageError::unavailable(
            StorageOp::AnswerCommit,
            "disk full".into(),
            std::io::Error::other("disk full"),
        );
        assert_eq!(err.op(), StorageOp::AnswerCommit);
        assert_eq!(
            err.to_string(),
            "storage unavailable during answer commit: disk full"
        );
    }
}
