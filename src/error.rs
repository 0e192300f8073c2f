//! Errors the engine surfaces to its caller.

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Errors surfaced by the game engine.
///
/// Player mistakes are not errors: they come back as an invalid
/// [`Outcome`](crate::engine::Outcome) because rejecting an answer still
/// mutates the game (it resets the channel's run).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The channel has no game state; the caller should ignore the message.
    #[error("channel is not registered for the game")]
    ChannelNotRegistered,
    /// The storage backend failed; the answer had no effect.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
