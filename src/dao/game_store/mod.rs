pub mod memory;
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

use futures::future::BoxFuture;

use crate::dao::models::{ChannelStateEntity, UserStatsEntity};
use crate::dao::storage::StorageResult;

/// Stats counter to bump alongside an answer's state write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsUpdate {
    /// User whose counters change.
    pub user_id: String,
    /// True bumps `correct_answers`, false bumps `times_failed`.
    pub correct: bool,
}

/// Every effect of one processed answer, applied as a single atomic write.
///
/// Songs are cleared before the optional insert; an answer never needs both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCommit {
    /// Channel state replacing the previous row.
    pub state: ChannelStateEntity,
    /// Drop every used-song record for the channel first.
    pub clear_songs: bool,
    /// Canonical song name to record as used, if the answer produced one.
    pub record_song: Option<String>,
    /// User counters to bump for this answer.
    pub stats: Option<StatsUpdate>,
}

/// Abstraction over the persistence layer for channel game state, used songs,
/// and user stats.
///
/// Each operation is atomic on its own; the engine serializes the
/// read-decide-commit sequence per channel, so no cross-call transaction
/// support is required from implementations.
pub trait GameStore: Send + Sync {
    /// Fetch the state row for a channel, if the channel is registered.
    fn find_channel(
        &self,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ChannelStateEntity>>>;

    /// Make `channel_id` the guild's active game channel, dropping the guild's
    /// previous channel rows and their used songs.
    fn register_channel(
        &self,
        guild_id: String,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<()>>;

    /// Whether the channel is registered for the given guild.
    fn is_registered(
        &self,
        channel_id: String,
        guild_id: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Whether the canonical song name was already accepted in the channel's
    /// current run.
    fn is_song_used(
        &self,
        channel_id: String,
        song_name: String,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Apply every effect of one answer; either all of them land or none.
    fn commit_answer(&self, commit: AnswerCommit) -> BoxFuture<'static, StorageResult<()>>;

    /// Fetch the counters for a user, if any answer was ever recorded.
    fn user_stats(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>>;
}
