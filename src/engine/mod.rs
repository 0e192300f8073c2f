//! The per-channel game state machine and its surrounding orchestration.

mod outcome;
mod transition;

pub use outcome::{Outcome, Rejection};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

use crate::{
    catalog::Catalog,
    dao::{
        game_store::{AnswerCommit, GameStore, StatsUpdate},
        models::{ChannelStateEntity, Subsection, UserStatsEntity},
    },
    error::EngineError,
};

/// Shared handle to the process-wide catalog ordering.
///
/// Direction is global: a reversal triggered by any channel changes what every
/// channel traverses next.
pub type SharedCatalog = Arc<RwLock<Catalog>>;

/// Validates answers, advances or resets per-channel progress, and reverses
/// the catalog at cycle boundaries.
///
/// Answers for the same channel are serialized through a per-channel gate so
/// the read-decide-commit sequence never interleaves; different channels
/// proceed concurrently.
pub struct GameEngine {
    store: Arc<dyn GameStore>,
    catalog: SharedCatalog,
    channel_gates: DashMap<String, Arc<Mutex<()>>>,
}

/// What an accepted answer resolved to, carried from validation to the
/// state advance.
struct Accepted {
    stage_count: u32,
    album: String,
    resolved_song: Option<String>,
}

impl GameEngine {
    /// Build an engine over a store and the loaded catalog.
    pub fn new(store: Arc<dyn GameStore>, catalog: Catalog) -> Self {
        Self {
            store,
            catalog: Arc::new(RwLock::new(catalog)),
            channel_gates: DashMap::new(),
        }
    }

    /// Handle to the shared catalog, direction included.
    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    /// Process one normalized answer for a channel.
    ///
    /// The caller strips punctuation and lower-cases the text before handing
    /// it in. Returns the outcome to render, or an error when the channel is
    /// unknown or storage failed; a storage failure leaves no partial effects
    /// behind.
    pub async fn submit_answer(
        &self,
        channel_id: &str,
        user_id: &str,
        answer: &str,
    ) -> Result<Outcome, EngineError> {
        let gate = self.channel_gate(channel_id);
        let _serialized = gate.lock().await;

        let Some(state) = self.store.find_channel(channel_id.to_owned()).await? else {
            return Err(EngineError::ChannelNotRegistered);
        };

        let verdict = if state.last_player_id.as_deref() == Some(user_id) {
            Err(Rejection::RepeatPlayer)
        } else {
            self.check_answer(&state, answer).await?
        };

        match verdict {
            Ok(accepted) => self.apply_accepted(&state, accepted, user_id).await,
            Err(rejection) => self.apply_rejected(&state, rejection, user_id).await,
        }
    }

    /// Make `channel_id` the guild's game channel, wiping the guild's
    /// previous channel and its run data.
    pub async fn register_channel(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<(), EngineError> {
        self.store
            .register_channel(guild_id.to_owned(), channel_id.to_owned())
            .await?;
        info!(
            guild = guild_id,
            channel = channel_id,
            "channel registered; previous guild data cleared"
        );
        Ok(())
    }

    /// Whether answers from this channel/guild pair should reach the game.
    pub async fn is_registered(
        &self,
        channel_id: &str,
        guild_id: &str,
    ) -> Result<bool, EngineError> {
        Ok(self
            .store
            .is_registered(channel_id.to_owned(), guild_id.to_owned())
            .await?)
    }

    /// Current state of a channel, for score and high-score display.
    pub async fn channel_state(
        &self,
        channel_id: &str,
    ) -> Result<ChannelStateEntity, EngineError> {
        self.store
            .find_channel(channel_id.to_owned())
            .await?
            .ok_or(EngineError::ChannelNotRegistered)
    }

    /// Global counters for a user; zeroed (100% correct) when nothing was
    /// recorded yet.
    pub async fn user_stats(&self, user_id: &str) -> Result<UserStatsEntity, EngineError> {
        Ok(self
            .store
            .user_stats(user_id.to_owned())
            .await?
            .unwrap_or_else(|| UserStatsEntity::new(user_id.to_owned())))
    }

    /// Classify the answer against the current subsection.
    async fn check_answer(
        &self,
        state: &ChannelStateEntity,
        answer: &str,
    ) -> Result<Result<Accepted, Rejection>, EngineError> {
        let catalog = self.catalog.read().await;
        let stage_count = catalog.stage_count() as u32;
        let logical = catalog.logical_stage(state.stage);
        let stage = catalog.stage(logical);
        let album = stage.album.clone();

        let verdict = match state.subsection {
            Subsection::Number => {
                let token = catalog.number(logical);
                if token.matches(answer) {
                    Ok(Accepted {
                        stage_count,
                        album,
                        resolved_song: None,
                    })
                } else {
                    Err(Rejection::WrongNumber {
                        expected: token.display.clone(),
                    })
                }
            }
            Subsection::Album => {
                if stage.matches_album(answer) {
                    Ok(Accepted {
                        stage_count,
                        album,
                        resolved_song: None,
                    })
                } else {
                    Err(Rejection::WrongAlbum { expected: album })
                }
            }
            Subsection::Song => match stage.resolve_song(answer) {
                None => Err(Rejection::UnknownSong { album }),
                Some(song) => {
                    if song == stage.album && state.entries_so_far == 0 {
                        Err(Rejection::TitleTrackFirst)
                    } else if self
                        .store
                        .is_song_used(state.channel_id.clone(), song.to_owned())
                        .await?
                    {
                        Err(Rejection::DuplicateSong {
                            song: song.to_owned(),
                        })
                    } else {
                        Ok(Accepted {
                            stage_count,
                            album,
                            resolved_song: Some(song.to_owned()),
                        })
                    }
                }
            },
        };

        Ok(verdict)
    }

    async fn apply_accepted(
        &self,
        state: &ChannelStateEntity,
        accepted: Accepted,
        user_id: &str,
    ) -> Result<Outcome, EngineError> {
        let advance = transition::advance(
            state,
            accepted.stage_count,
            &accepted.album,
            accepted.resolved_song.as_deref(),
            user_id,
        );

        self.store
            .commit_answer(AnswerCommit {
                state: advance.next,
                clear_songs: advance.clear_songs,
                record_song: advance.record_song,
                stats: Some(StatsUpdate {
                    user_id: user_id.to_owned(),
                    correct: true,
                }),
            })
            .await
            .map_err(|err| {
                error!(channel = %state.channel_id, error = %err, "failed to persist accepted answer");
                err
            })?;

        // Only a persisted cycle flips the shared direction.
        if advance.cycle_complete {
            let mut catalog = self.catalog.write().await;
            catalog.reverse();
            info!(
                channel = %state.channel_id,
                leading_album = catalog.leading_album(),
                "cycle complete; catalog direction reversed"
            );
        }

        Ok(Outcome::accepted(advance.cycle_complete))
    }

    async fn apply_rejected(
        &self,
        state: &ChannelStateEntity,
        rejection: Rejection,
        user_id: &str,
    ) -> Result<Outcome, EngineError> {
        // Bootstrap forgiveness: a wrong number on stage 1 resets silently so
        // idle chatter in a fresh channel is not scolded.
        let silent = state.stage == 1 && matches!(rejection, Rejection::WrongNumber { .. });

        self.store
            .commit_answer(AnswerCommit {
                state: transition::reset(state),
                clear_songs: true,
                record_song: None,
                stats: Some(StatsUpdate {
                    user_id: user_id.to_owned(),
                    correct: false,
                }),
            })
            .await
            .map_err(|err| {
                error!(channel = %state.channel_id, error = %err, "failed to persist reset");
                err
            })?;

        Ok(Outcome::rejected(rejection, silent))
    }

    fn channel_gate(&self, channel_id: &str) -> Arc<Mutex<()>> {
        self.channel_gates
            .entry(channel_id.to_owned())
            .or_default()
            .clone()
    }
}
