use serde::Serialize;

/// Informational status handed to the presentation layer alongside results.
/// None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Notice {
    NoMatches,
    NoCandidates,
    NotEnoughMetrics,
    PlayerNotFound,
    EmptyWatchlist,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::NoMatches => "No players match these filters.",
            Notice::NoCandidates => "No candidates match these filters. Adjust the thresholds.",
            Notice::NotEnoughMetrics => "Not enough metrics for a radar chart (need at least 3).",
            Notice::PlayerNotFound => "Player not found.",
            Notice::EmptyWatchlist => "Your watchlist is empty.",
        }
    }
}
