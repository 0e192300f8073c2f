use thiserror::Error;

/// Result alias for SQLite store operations.
pub type SqliteResult<T> = std::result::Result<T, SqliteDaoError>;

/// Errors raised by the SQLite store, tagged with the operation that failed.
#[derive(Debug, Error)]
pub enum SqliteDaoError {
    /// The database file could not be opened or created.
    #[error("failed to open SQLite database at `{path}`")]
    Open {
        /// Path that was attempted.
        path: String,
        #[source]
        source: sqlx::Error,
    },
    /// A pragma or `CREATE TABLE` statement failed.
    #[error("failed to bootstrap SQLite schema")]
    Schema {
        #[source]
        source: sqlx::Error,
    },
    /// The channel's state row could not be read.
    #[error("failed to load channel `{channel_id}`")]
    LoadChannel {
        /// Channel whose row was requested.
        channel_id: String,
        #[source]
        source: sqlx::Error,
    },
    /// A column of a fetched row had an unexpected type.
    #[error("failed to decode column `{column}` from a channel row")]
    Decode {
        /// Column that failed to decode.
        column: &'static str,
        #[source]
        source: sqlx::Error,
    },
    /// A fetched row decoded but holds a value outside the game's domain.
    #[error("channel `{channel_id}` row is corrupt: {detail}")]
    CorruptRow {
        /// Channel whose row is corrupt.
        channel_id: String,
        /// What was out of range.
        detail: String,
    },
    /// The registration transaction could not complete.
    #[error("failed to register channel `{channel_id}` for guild `{guild_id}`")]
    RegisterChannel {
        /// Guild being re-pointed at a new channel.
        guild_id: String,
        /// Channel being registered.
        channel_id: String,
        #[source]
        source: sqlx::Error,
    },
    /// The used-song membership check failed.
    #[error("failed to query used songs for channel `{channel_id}`")]
    SongLookup {
        /// Channel whose used set was queried.
        channel_id: String,
        #[source]
        source: sqlx::Error,
    },
    /// The answer's transaction could not commit.
    #[error("failed to commit answer for channel `{channel_id}`")]
    CommitAnswer {
        /// Channel whose answer was being persisted.
        channel_id: String,
        #[source]
        source: sqlx::Error,
    },
    /// The user's counters could not be read.
    #[error("failed to load stats for user `{user_id}`")]
    LoadStats {
        /// User whose counters were requested.
        user_id: String,
        #[source]
        source: sqlx::Error,
    },
}
