//! Pure state arithmetic for one accepted or rejected answer.

use crate::dao::models::{ChannelStateEntity, Subsection};

/// Effects of advancing a channel after a valid answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Advance {
    /// State replacing the channel's previous row.
    pub next: ChannelStateEntity,
    /// Canonical song to record as used, when the answer produced one.
    pub record_song: Option<String>,
    /// The stage incremented, so the channel's used songs must be dropped.
    pub clear_songs: bool,
    /// The old stage closed a full cycle; the catalog direction must flip.
    pub cycle_complete: bool,
}

/// Advance `state` by one valid answer.
///
/// The current logical stage dictates how many entries each subsection needs;
/// filling the last entry of the Song subsection rolls the channel over into
/// the next stage. `current_album` is the album of the OLD stage, recorded as
/// `highest_album` when this answer sets a new high score.
pub(crate) fn advance(
    state: &ChannelStateEntity,
    stage_count: u32,
    current_album: &str,
    resolved_song: Option<&str>,
    user_id: &str,
) -> Advance {
    let logical = ((state.stage - 1) % stage_count) + 1;
    let mut next = state.clone();
    let mut record_song = None;
    let mut clear_songs = false;

    if state.entries_so_far + 1 == logical {
        next.entries_so_far = 0;
        match state.subsection {
            Subsection::Number => next.subsection = Subsection::Album,
            Subsection::Album => next.subsection = Subsection::Song,
            Subsection::Song => {
                next.subsection = Subsection::Number;
                next.stage = state.stage + 1;
                clear_songs = true;
            }
        }
    } else {
        next.entries_so_far = state.entries_so_far + 1;
        if state.subsection == Subsection::Song {
            record_song = resolved_song.map(str::to_owned);
        }
    }

    next.score = state.score + 1;
    if next.score > state.high_score {
        next.high_score = next.score;
        next.highest_album = Some(current_album.to_owned());
        next.rounds_completed = (state.stage - 1) / stage_count;
    }
    next.last_player_id = Some(user_id.to_owned());

    let cycle_complete = state.stage % stage_count == 0 && next.stage % stage_count == 1;

    Advance {
        next,
        record_song,
        clear_songs,
        cycle_complete,
    }
}

/// State after a rejected answer: the run restarts, historical fields stay.
pub(crate) fn reset(state: &ChannelStateEntity) -> ChannelStateEntity {
    ChannelStateEntity {
        score: 0,
        stage: 1,
        subsection: Subsection::Number,
        entries_so_far: 0,
        last_player_id: None,
        ..state.clone()
    }
}
