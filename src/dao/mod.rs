/// Channel state, used-song, and user-stats storage operations.
pub mod game_store;
/// Entities shared between the engine and storage backends.
pub mod models;
/// Backend-agnostic storage error surface.
pub mod storage;
