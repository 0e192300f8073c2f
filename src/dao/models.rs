use serde::{Deserialize, Serialize};

/// Answer category a channel currently expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subsection {
    /// The stage's number token must be said next.
    Number,
    /// The stage's album name must be said next.
    Album,
    /// A song from the stage's album must be said next.
    Song,
}

impl Subsection {
    /// Stable numeric encoding used by storage backends.
    pub fn as_raw(self) -> i64 {
        match self {
            Subsection::Number => 0,
            Subsection::Album => 1,
            Subsection::Song => 2,
        }
    }

    /// Decode the storage encoding produced by [`Subsection::as_raw`].
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Subsection::Number),
            1 => Some(Subsection::Album),
            2 => Some(Subsection::Song),
            _ => None,
        }
    }
}

/// Per-channel game state persisted by the storage layer and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelStateEntity {
    /// Chat-platform identifier of the game channel (primary key).
    pub channel_id: String,
    /// Chat-platform identifier of the guild the channel belongs to.
    pub guild_id: String,
    /// Length of the current run of valid answers.
    pub score: u32,
    /// Best score ever reached in this channel.
    pub high_score: u32,
    /// Current stage, 1-based and unbounded; only its logical position wraps.
    pub stage: u32,
    /// Answer category currently required.
    pub subsection: Subsection,
    /// Valid entries already given for the current subsection.
    pub entries_so_far: u32,
    /// Player who gave the previous valid answer, if any.
    pub last_player_id: Option<String>,
    /// Album the channel had reached when the high score was set.
    pub highest_album: Option<String>,
    /// Completed full catalog cycles when the high score was set.
    pub rounds_completed: u32,
}

impl ChannelStateEntity {
    /// State of a freshly registered channel.
    pub fn fresh(guild_id: &str, channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_owned(),
            guild_id: guild_id.to_owned(),
            score: 0,
            high_score: 0,
            stage: 1,
            subsection: Subsection::Number,
            entries_so_far: 0,
            last_player_id: None,
            highest_album: None,
            rounds_completed: 0,
        }
    }
}

/// Global per-user answer counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStatsEntity {
    /// Chat-platform identifier of the user (primary key).
    pub user_id: String,
    /// Answers this user got right, across all channels.
    pub correct_answers: u32,
    /// Answers this user got wrong, across all channels.
    pub times_failed: u32,
}

impl UserStatsEntity {
    /// Zeroed counters for a user with no recorded answers.
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            correct_answers: 0,
            times_failed: 0,
        }
    }

    /// Share of correct answers as a percentage, rounded to one decimal.
    ///
    /// A user with no recorded answers is at 100.
    pub fn percentage_correct(&self) -> f64 {
        let total = self.correct_answers + self.times_failed;
        if total == 0 {
            return 100.0;
        }
        (f64::from(self.correct_answers) * 1000.0 / f64::from(total)).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsection_raw_round_trip() {
        for subsection in [Subsection::Number, Subsection::Album, Subsection::Song] {
            assert_eq!(Subsection::from_raw(subsection.as_raw()), Some(subsection));
        }
        assert_eq!(Subsection::from_raw(3), None);
        assert_eq!(Subsection::from_raw(-1), None);
    }

    #[test]
    fn percentage_is_100_without_answers() {
        let stats = UserStatsEntity::new("u1".into());
        assert_eq!(stats.percentage_correct(), 100.0);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        let stats = UserStatsEntity {
            user_id: "u1".into(),
            correct_answers: 2,
            times_failed: 1,
        };
        assert_eq!(stats.percentage_correct(), 66.7);

        let stats = UserStatsEntity {
            user_id: "u2".into(),
            correct_answers: 1,
            times_failed: 3,
        };
        assert_eq!(stats.percentage_correct(), 25.0);
    }

    #[test]
    fn fresh_channel_starts_at_stage_one() {
        let state = ChannelStateEntity::fresh("g1", "c1");
        assert_eq!(state.stage, 1);
        assert_eq!(state.subsection, Subsection::Number);
        assert_eq!(state.entries_so_far, 0);
        assert_eq!(state.score, 0);
        assert!(state.last_player_id.is_none());
    }
}
