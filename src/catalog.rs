//! Reference data the quiz traverses: ordered stages with album and song
//! variants, plus the parallel number-token sequence.

use crate::matcher::{self, NAME_SIMILARITY_THRESHOLD};

/// One song of a stage: canonical name plus accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    /// Canonical name, recorded for duplicate detection.
    pub name: String,
    /// Accepted spellings, normalized the way answers arrive.
    pub variants: Vec<String>,
}

/// One stage of the catalog: an album and its ordered songs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Display name of the album.
    pub album: String,
    /// Accepted spellings of the album name.
    pub album_variants: Vec<String>,
    /// Songs of the album, in album order.
    pub songs: Vec<Song>,
}

impl Stage {
    /// Whether `text` is an acceptable rendering of this stage's album name.
    pub fn matches_album(&self, text: &str) -> bool {
        self.album_variants
            .iter()
            .any(|variant| matcher::similar(text, variant, NAME_SIMILARITY_THRESHOLD))
    }

    /// Resolve `text` to the canonical name of one of this stage's songs.
    ///
    /// Songs are tried in album order and the first variant match wins;
    /// unresolvable input yields `None`.
    pub fn resolve_song(&self, text: &str) -> Option<&str> {
        self.songs
            .iter()
            .find(|song| {
                song.variants
                    .iter()
                    .any(|variant| matcher::similar(text, variant, NAME_SIMILARITY_THRESHOLD))
            })
            .map(|song| song.name.as_str())
    }
}

/// Number token accepted at one catalog position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberToken {
    /// Token shown to players when they get the number wrong.
    pub display: String,
    /// Exact renderings accepted for this token (digits, words, ordinals).
    pub variants: Vec<String>,
}

impl NumberToken {
    /// Whether `text` is exactly one of the accepted renderings.
    pub fn matches(&self, text: &str) -> bool {
        self.variants.iter().any(|variant| variant == text)
    }
}

/// Ordered catalog shared by every channel in the process.
///
/// The ordering is mutable: completing a cycle reverses BOTH sequences in
/// place, so the next traversal runs in the opposite direction for all
/// channels at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    stages: Vec<Stage>,
    numbers: Vec<NumberToken>,
}

impl Catalog {
    /// Build a catalog from parallel stage and number sequences.
    ///
    /// Callers must hand in sequences of equal, non-zero length (the config
    /// loader validates this).
    pub fn new(stages: Vec<Stage>, numbers: Vec<NumberToken>) -> Self {
        Self { stages, numbers }
    }

    /// Number of stages in one full cycle.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Position of an unbounded 1-based stage within one traversal, in
    /// `[1, stage_count]`.
    pub fn logical_stage(&self, stage: u32) -> u32 {
        let n = self.stages.len() as u32;
        ((stage - 1) % n) + 1
    }

    /// Stage at a 1-based logical position.
    pub fn stage(&self, logical: u32) -> &Stage {
        &self.stages[(logical - 1) as usize]
    }

    /// Number token at a 1-based logical position.
    pub fn number(&self, logical: u32) -> &NumberToken {
        &self.numbers[(logical - 1) as usize]
    }

    /// Album the next cycle opens with, for logging after a reversal.
    pub fn leading_album(&self) -> &str {
        &self.stages[0].album
    }

    /// Flip the traversal direction by reversing the stage ordering and, with
    /// it, the number-token ordering.
    pub fn reverse(&mut self) {
        self.stages.reverse();
        self.numbers.reverse();
    }
}
