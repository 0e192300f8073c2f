use thiserror::Error;

/// Message attached to the answer that completes a full catalog cycle.
const CYCLE_COMPLETE_MESSAGE: &str =
    "Congratulations! You reached the end of the round! The direction now reverses, keep going!";

/// Why an answer was rejected. Every rejection resets the channel's run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The same player answered twice in a row.
    #[error("You can't go twice in a row!")]
    RepeatPlayer,
    /// The answer did not match the expected number token.
    #[error("Pay attention! Pay attention! You should've said {expected}!")]
    WrongNumber {
        /// Token that was expected.
        expected: String,
    },
    /// The answer did not match the expected album name.
    #[error("Pay attention! Pay attention! You should've said {expected}!")]
    WrongAlbum {
        /// Album that was expected.
        expected: String,
    },
    /// The answer did not resolve to any song of the current album.
    #[error("Pay attention! Pay attention! You should've given a song from {album}!")]
    UnknownSong {
        /// Album whose songs were expected.
        album: String,
    },
    /// The title track cannot open the song subsection.
    #[error("The title track is not allowed right after the album name!")]
    TitleTrackFirst,
    /// The song was already said in this channel's current run.
    #[error("No duplicate songs! {song} has already been said!")]
    DuplicateSong {
        /// Canonical name that was repeated.
        song: String,
    },
}

/// Result of one submitted answer, for the chat layer to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the answer advanced the game.
    pub valid: bool,
    /// Text for the caller to post; empty for an ordinary valid answer.
    pub message: String,
    /// When set the caller should post nothing (bootstrap forgiveness at
    /// stage 1).
    pub silent: bool,
    /// The answer completed a full catalog cycle and the direction reversed.
    pub cycle_complete: bool,
    /// Why the answer was rejected, when it was.
    pub rejection: Option<Rejection>,
}

impl Outcome {
    pub(crate) fn accepted(cycle_complete: bool) -> Self {
        let message = if cycle_complete {
            CYCLE_COMPLETE_MESSAGE.to_owned()
        } else {
            String::new()
        };
        Self {
            valid: true,
            message,
            silent: false,
            cycle_complete,
            rejection: None,
        }
    }

    pub(crate) fn rejected(rejection: Rejection, silent: bool) -> Self {
        Self {
            valid: false,
            message: rejection.to_string(),
            silent,
            cycle_complete: false,
            rejection: Some(rejection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_renders_the_player_facing_message() {
        let outcome = Outcome::rejected(
            Rejection::DuplicateSong {
                song: "love story".into(),
            },
            false,
        );
        assert!(!outcome.valid);
        assert_eq!(
            outcome.message,
            "No duplicate songs! love story has already been said!"
        );
        assert!(!outcome.silent);
    }

    #[test]
    fn accepted_answer_is_plain_unless_a_cycle_completed() {
        assert_eq!(Outcome::accepted(false).message, "");
        assert!(Outcome::accepted(true).message.contains("reverses"));
        assert!(Outcome::accepted(true).cycle_complete);
    }
}
