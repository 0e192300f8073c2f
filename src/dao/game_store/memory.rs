use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use super::{AnswerCommit, GameStore};
use crate::dao::{
    models::{ChannelStateEntity, UserStatsEntity},
    storage::StorageResult,
};

/// In-memory game store backed by concurrent maps.
///
/// Serves as the test double for the engine and as a storage-free fallback;
/// all data is lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    channels: DashMap<String, ChannelStateEntity>,
    used_songs: DashMap<String, HashSet<String>>,
    users: DashMap<String, UserStatsEntity>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn find_channel(
        &self,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ChannelStateEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .channels
                .get(&channel_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn register_channel(
        &self,
        guild_id: String,
        channel_id: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let stale: Vec<String> = store
                .inner
                .channels
                .iter()
                .filter(|entry| entry.value().guild_id == guild_id)
                .map(|entry| entry.key().clone())
                .collect();
            for id in stale {
                store.inner.channels.remove(&id);
                store.inner.used_songs.remove(&id);
            }

            // The channel may have been registered under another guild before.
            store.inner.used_songs.remove(&channel_id);
            store.inner.channels.insert(
                channel_id.clone(),
                ChannelStateEntity::fresh(&guild_id, &channel_id),
            );
            Ok(())
        })
    }

    fn is_registered(
        &self,
        channel_id: String,
        guild_id: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .channels
                .get(&channel_id)
                .is_some_and(|entry| entry.value().guild_id == guild_id))
        })
    }

    fn is_song_used(
        &self,
        channel_id: String,
        song_name: String,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .used_songs
                .get(&channel_id)
                .is_some_and(|entry| entry.value().contains(&song_name)))
        })
    }

    fn commit_answer(&self, commit: AnswerCommit) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let channel_id = commit.state.channel_id.clone();
            if commit.clear_songs {
                store.inner.used_songs.remove(&channel_id);
            }
            if let Some(song) = commit.record_song {
                store
                    .inner
                    .used_songs
                    .entry(channel_id.clone())
                    .or_default()
                    .insert(song);
            }
            store.inner.channels.insert(channel_id, commit.state);

            if let Some(update) = commit.stats {
                let mut stats = store
                    .inner
                    .users
                    .entry(update.user_id.clone())
                    .or_insert_with(|| UserStatsEntity::new(update.user_id));
                if update.correct {
                    stats.correct_answers += 1;
                } else {
                    stats.times_failed += 1;
                }
            }
            Ok(())
        })
    }

    fn user_stats(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserStatsEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .users
                .get(&user_id)
                .map(|entry| entry.value().clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::game_store::StatsUpdate;

    #[tokio::test]
    async fn registering_replaces_previous_guild_channel() {
        let store = MemoryGameStore::new();
        store
            .register_channel("g1".into(), "c1".into())
            .await
            .unwrap();
        store
            .register_channel("g1".into(), "c2".into())
            .await
            .unwrap();

        assert!(store.find_channel("c1".into()).await.unwrap().is_none());
        assert!(store.find_channel("c2".into()).await.unwrap().is_some());
        assert!(store.is_registered("c2".into(), "g1".into()).await.unwrap());
        assert!(!store.is_registered("c1".into(), "g1".into()).await.unwrap());
    }

    #[tokio::test]
    async fn commit_records_and_clears_songs() {
        let store = MemoryGameStore::new();
        store
            .register_channel("g1".into(), "c1".into())
            .await
            .unwrap();
        let state = store.find_channel("c1".into()).await.unwrap().unwrap();

        store
            .commit_answer(AnswerCommit {
                state: state.clone(),
                clear_songs: false,
                record_song: Some("love story".into()),
                stats: None,
            })
            .await
            .unwrap();
        assert!(
            store
                .is_song_used("c1".into(), "love story".into())
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
                .is_song_used("c1".into(), "love story".into())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn stats_accumulate_per_user() {
        let store = MemoryGameStore::new();
        store
            .register_channel("g1".into(), "c1".into())
            .await
            .unwrap();
        let state = store.find_channel("c1".into()).await.unwrap().unwrap();

        for correct in [true, true, false] {
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
        assert_eq!(stats.correct_answers, 2);
        assert_eq!(stats.times_failed, 1);
        assert!(store.user_stats("u2".into()).await.unwrap().is_none());
    }
}
