use futures::future::BoxFuture;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqlitePoolOptions, SqliteRow},
};

use super::error::{SqliteDaoError, SqliteResult};
use crate::dao::{
    game_store::{AnswerCommit, GameStore},
    models::{ChannelStateEntity, Subsection, UserStatsEntity},
    storage::StorageResult,
};

/// Statements run once per connection lifecycle before the schema bootstrap.
const PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON",
    "PRAGMA journal_mode = WAL",
    "PRAGMA busy_timeout = 5000",
];

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS channels ( \
        channel_id TEXT PRIMARY KEY, \
        guild_id TEXT NOT NULL, \
        score INTEGER NOT NULL, \
        high_score INTEGER NOT NULL, \
        stage INTEGER NOT NULL, \
        subsection INTEGER NOT NULL, \
        entries_so_far INTEGER NOT NULL, \
        last_player_id TEXT, \
        highest_album TEXT, \
        rounds_completed INTEGER NOT NULL \
    )",
    "CREATE TABLE IF NOT EXISTS used_songs ( \
        channel_id TEXT NOT NULL, \
        song_name TEXT NOT NULL, \
        PRIMARY KEY (channel_id, song_name), \
        FOREIGN KEY (channel_id) REFERENCES channels (channel_id) ON DELETE CASCADE \
    )",
    "CREATE TABLE IF NOT EXISTS users ( \
        user_id TEXT PRIMARY KEY, \
        correct_answers INTEGER NOT NULL, \
        times_failed INTEGER NOT NULL \
    )",
];

/// SQLite-backed game store.
#[derive(Clone)]
pub struct SqliteGameStore {
    pool: SqlitePool,
}

impl SqliteGameStore {
    /// Open (creating if needed) the database at `path` and bootstrap the schema.
    pub async fn connect(path: &str) -> SqliteResult<Self> {
        let url = format!("sqlite://{path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|source| SqliteDaoError::Open {
                path: path.to_owned(),
                source,
            })?;
        Self::prepare(pool).await
    }

    /// Open a private in-memory database, mainly for tests.
    pub async fn connect_in_memory() -> SqliteResult<Self> {
        // A single never-recycled connection: each SQLite memory connection is
        // its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|source| SqliteDaoError::Open {
                path: ":memory:".to_owned(),
                source,
            })?;
        Self::prepare(pool).await
    }

    async fn prepare(pool: SqlitePool) -> SqliteResult<Self> {
        for pragma in PRAGMAS {
            sqlx::query(pragma)
                .execute(&pool)
                .await
                .map_err(|source| SqliteDaoError::Schema { source })?;
        }
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> SqliteResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|source| SqliteDaoError::Schema { source })?;
        }
        Ok(())
    }

    async fn find_channel(&self, channel_id: String) -> SqliteResult<Option<ChannelStateEntity>> {
        let row = sqlx::query(
            "SELECT channel_id, guild_id, score, high_score, stage, subsection, \
             entries_so_far, last_player_id, highest_album, rounds_completed \
             FROM channels WHERE channel_id = ?",
        )
        .bind(&channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| SqliteDaoError::LoadChannel {
            channel_id: channel_id.clone(),
            source,
        })?;

        row.map(|row| entity_from_row(&row)).transpose()
    }

    async fn register_channel(&self, guild_id: String, channel_id: String) -> SqliteResult<()> {
        let register_err = |source| SqliteDaoError::RegisterChannel {
            guild_id: guild_id.clone(),
            channel_id: channel_id.clone(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(register_err)?;

        // Drop the guild's previous channel rows; the songs cascade. The new
        // channel may also carry songs from a registration under another guild.
        sqlx::query("DELETE FROM channels WHERE guild_id = ?")
            .bind(&guild_id)
            .execute(&mut *tx)
            .await
            .map_err(register_err)?;
        sqlx::query("DELETE FROM used_songs WHERE channel_id = ?")
            .bind(&channel_id)
            .execute(&mut *tx)
            .await
            .map_err(register_err)?;

        let fresh = ChannelStateEntity::fresh(&guild_id, &channel_id);
        upsert_channel(&fresh)
            .execute(&mut *tx)
            .await
            .map_err(register_err)?;

        tx.commit().await.map_err(register_err)
    }

    async fn is_registered(&self, channel_id: String, guild_id: String) -> SqliteResult<bool> {
        let row = sqlx::query("SELECT 1 FROM channels WHERE channel_id = ? AND guild_id = ?")
            .bind(&channel_id)
            .bind(&guild_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::LoadChannel {
                channel_id: channel_id.clone(),
                source,
            })?;
        Ok(row.is_some())
    }

    async fn is_song_used(&self, channel_id: String, song_name: String) -> SqliteResult<bool> {
        let row = sqlx::query("SELECT 1 FROM used_songs WHERE channel_id = ? AND song_name = ?")
            .bind(&channel_id)
            .bind(&song_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| SqliteDaoError::SongLookup {
                channel_id: channel_id.clone(),
                source,
            })?;
        Ok(row.is_some())
    }

    async fn commit_answer(&self, commit: AnswerCommit) -> SqliteResult<()> {
        let channel_id = commit.state.channel_id.clone();
        let commit_err = |source| SqliteDaoError::CommitAnswer {
            channel_id: channel_id.clone(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(commit_err)?;

        if commit.clear_songs {
            sqlx::query("DELETE FROM used_songs WHERE channel_id = ?")
                .bind(&channel_id)
                .execute(&mut *tx)
                .await
                .map_err(commit_err)?;
        }

        upsert_channel(&commit.state)
            .execute(&mut *tx)
            .await
            .map_err(commit_err)?;

        if let Some(song) = &commit.record_song {
            sqlx::query("INSERT OR IGNORE INTO used_songs (channel_id, song_name) VALUES (?, ?)")
                .bind(&channel_id)
                .bind(song)
                .execute(&mut *tx)
                .await
                .map_err(commit_err)?;
        }

        if let Some(update) = &commit.stats {
            let (correct, failed): (i64, i64) = if update.correct { (1, 0) } else { (0, 1) };
            sqlx::query(
                "INSERT INTO users (user_id, correct_answers, times_failed) VALUES (?, ?, ?) \
                 ON CONFLICT (user_id) DO UPDATE SET \
                 correct_answers = correct_answers + excluded.correct_answers, \
                 times_failed = times_failed + excluded.times_failed",
            )
            .bind(&update.user_id)
            .bind(correct)
            .bind(failed)
            .execute(&mut *tx)
            .await
            .map_err(commit_err)?;
        }

        tx.commit().await.map_err(commit_err)
    }

    async fn user_stats(&self, user_id: String) -> SqliteResult<Option<UserStatsEntity>> {
        let row = sqlx::query(
            "SELECT user_id, correct_answers, times_failed FROM users WHERE user_id = ?",
        )
        .bind(&user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| SqliteDaoError::LoadStats {
            user_id: user_id.clone(),
            source,
        })?;

        row.map(|row| {
            Ok(UserStatsEntity {
                user_id: decode(&row, "user_id")?,
                correct_answers: decode(&row, "correct_answers")?,
                times_failed: decode(&row, "times_failed")?,
            })
        })
        .transpose()
    }
}

/// Upsert that never deletes the existing row, so the used-songs cascade
/// cannot fire on a routine state write.
fn upsert_channel(
    state: &ChannelStateEntity,
) -> sqlx::query::Query<'_, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(
        "INSERT INTO channels (channel_id, guild_id, score, high_score, stage, subsection, \
         entries_so_far, last_player_id, highest_album, rounds_completed) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
         ON CONFLICT (channel_id) DO UPDATE SET \
         guild_id = excluded.guild_id, \
         score = excluded.score, \
         high_score = excluded.high_score, \
         stage = excluded.stage, \
         subsection = excluded.subsection, \
         entries_so_far = excluded.entries_so_far, \
         last_player_id = excluded.last_player_id, \
         highest_album = excluded.highest_album, \
         rounds_completed = excluded.rounds_completed",
    )
    .bind(&state.channel_id)
    .bind(&state.guild_id)
    .bind(state.score)
    .bind(state.high_score)
    .bind(state.stage)
    .bind(state.subsection.as_raw())
    .bind(state.entries_so_far)
    .bind(state.last_player_id.as_deref())
    .bind(state.highest_album.as_deref())
    .bind(state.rounds_completed)
}

fn decode<'r, T>(row: &'r SqliteRow, column: &'static str) -> SqliteResult<T>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column)
        .map_err(|source| SqliteDaoError::Decode { column, source })
}

fn entity_from_row(row: &SqliteRow) -> SqliteResult<ChannelStateEntity> {
    let channel_id: String = decode(row, "channel_id")?;
    let subsection_raw: i64 = decode(row, "subsection")?;
    let subsection =
        Subsection::from_raw(subsection_raw).ok_or_else(|| SqliteDaoError::CorruptRow {
            channel_id: channel_id.clone(),
            detail: format!("subsection {subsection_raw} out of range"),
        })?;

    Ok(ChannelStateEntity {
        channel_id,
        guild_id: decode(row, "guild_id")?,
        score: decode(row, "score")?,
        high_score: decode(row, "high_score")?,
        stage: decode(row, "stage")?,
        subsection,
        entries_so_far: decode(row, "entries_so_far")?,
        last_player_id: decode(row, "last_player_id")?,
        highest_album: decode(row, "highest_album")?,
        rounds_completed: decode(row, "rounds_completed")?,
    })
}

impl GameStore for SqliteGameStore {
    fn find_channel(
        &self,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ChannelStateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_channel(channel_id).await.map_err(Into::into) })
    }

    fn register_channel(
        &self,
        guild_id: String,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .register_channel(guild_id, channel_id)
                .await
                .map_err(Into::into)
        })
    }

    fn is_registered(
        &self,
        channel_id: String,
        guild_id: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .is_registered(channel_id, guild_id)
                .await
                .map_err(Into::into)
        })
    }

    fn is_song_used(
        &self,
        channel_id: String,
        song_name: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .is_song_used(channel_id, song_name)
                .await
                .map_err(Into::into)
        })
    }

    fn commit_answer(&self, commit: AnswerCommit) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.commit_answer(commit).await.map_err(Into::into) })
    }

    fn user_stats(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.user_stats(user_id).await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::game_store::StatsUpdate;

    #[tokio::test]
    async fn registration_round_trips_a_fresh_channel() {
        let store = SqliteGameStore::connect_in_memory().await.unwrap();
        store.register_channel("g1".into(), "c1".into()).await.unwrap();

        let state = store.find_channel("c1".into()).await.unwrap().unwrap();
        assert_eq!(state, ChannelStateEntity::fresh("g1", "c1"));
        assert!(store.is_registered("c1".into(), "g1".into()).await.unwrap());
        assert!(!store.is_registered("c1".into(), "g2".into()).await.unwrap());
    }

    #[tokio::test]
    async fn reregistering_a_guild_drops_the_previous_channel() {
        let store = SqliteGameStore::connect_in_memory().await.unwrap();
        store.register_channel("g1".into(), "c1".into()).await.unwrap();

        let mut state = store.find_channel("c1".into()).await.unwrap().unwrap();
        state.score = 4;
        store
            .commit_answer(AnswerCommit {
                state,
                clear_songs: false,
                record_song: Some("love story".into()),
                stats: None,
            })
            .await
            .unwrap();

        store.register_channel("g1".into(), "c2".into()).await.unwrap();
        assert!(store.find_channel("c1".into()).await.unwrap().is_none());
        assert!(
            !store
                .is_song_used("c1".into(), "love story".into())
                .await
                .unwrap()
        );
        let fresh = store.find_channel("c2".into()).await.unwrap().unwrap();
        assert_eq!(fresh.score, 0);
    }

    #[tokio::test]
    async fn commit_applies_state_song_and_stats_together() {
        let store = SqliteGameStore::connect_in_memory().await.unwrap();
        store.register_channel("g1".into(), "c1".into()).await.unwrap();

        let mut state = store.find_channel("c1".into()).await.unwrap().unwrap();
        state.score = 1;
        state.subsection = Subsection::Song;
        state.last_player_id = Some("u1".into());

        store
            .commit_answer(AnswerCommit {
                state: state.clone(),
                clear_songs: false,
                record_song: Some("love story".into()),
                stats: Some(StatsUpdate {
                    user_id: "u1".into(),
                    correct: true,
                }),
            })
            .await
            .unwrap();

        let loaded = store.find_channel("c1".into()).await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert!(
            store
                .is_song_used("c1".into(), "love story".into())
                .await
                .unwrap()
        );
        let stats = store.user_stats("u1".into()).await.unwrap().unwrap();
        assert_eq!(stats.correct_answers, 1);
        assert_eq!(stats.times_failed, 0);
    }

    #[tokio::test]
    async fn clearing_songs_survives_the_state_upsert() {
        let store = SqliteGameStore::connect_in_memory().await.unwrap();
        store.register_channel("g1".into(), "c1".into()).await.unwrap();
        let state = store.find_channel("c1".into()).await.unwrap().unwrap();

        store
            .commit_answer(AnswerCommit {
                state: state.clone(),
                clear_songs: false,
                record_song: Some("mirrorball".into()),
                stats: None,
            })
            .await
            .unwrap();

        // A state-only commit must not disturb recorded songs.
        store
            .commit_answer(AnswerCommit {
                state: state.clone(),
                clear_songs: false,
                record_song: None,
                stats: None,
            })
            .await
            .unwrap();
        assert!(
            store
                .is_song_used("c1".into(), "mirrorball".into())
                .await
                .unwrap()
        );

        store
            .commit_answer(AnswerCommit {
                state,
                clear_songs: true,
                record_song: None,
                stats: None,
            })
            .await
            .unwrap();
        assert!(
            !store
                .is_song_used("c1".into(), "mirrorball".into())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn stats_upsert_accumulates() {
        let store = SqliteGameStore::connect_in_memory().await.unwrap();
        store.register_channel("g1".into(), "c1".into()).await.unwrap();
        let state = store.find_channel("c1".into()).await.unwrap().unwrap();

        for correct in [true, false, false] {
            store
                .commit_answer(AnswerCommit {
                    state: state.clone(),
                    clear_songs: false,
                    record_song: None,
                    stats: Some(StatsUpdate {
                        user_id: "u1".into(),
                        correct,
                    }),
                })
                .await
                .unwrap();
        }

        let stats = store.user_stats("u1".into()).await.unwrap().unwrap();
        assert_eq!(stats.correct_answers, 1);
        assert_eq!(stats.times_failed, 2);
        assert!(store.user_stats("nobody".into()).await.unwrap().is_none());
    }
}
