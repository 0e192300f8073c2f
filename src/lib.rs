//! Core engine for the album chain quiz: catalog reference data, fuzzy answer
//! matching, the per-channel game state machine, and its storage contract.
//!
//! The chat platform in front of this crate normalizes message text, decides
//! which channels feed the game, and renders [`engine::Outcome`]s back to
//! players; everything about the game itself lives here.

pub mod catalog;
pub mod config;
pub mod dao;
pub mod engine;
pub mod error;
pub mod matcher;
