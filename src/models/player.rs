//! Participant rating record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (used in matches, registrations and fixtures).
pub type ParticipantId = Uuid;

/// Unique identifier for a club. Matches and leagues never cross clubs.
pub type ClubId = Uuid;

/// Rating every participant starts with.
pub const DEFAULT_RATING: i32 = 1000;

/// A club member with their live rating and match counters.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub club_id: ClubId,
    pub name: String,
    pub rating: i32,
    /// Validated (confirmed or auto-resolved) matches only.
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
}

impl Participant {
    /// Create a new participant at the default rating with no matches.
    pub fn new(club_id: ClubId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            club_id,
            name: name.into(),
            rating: DEFAULT_RATING,
            matches_played: 0,
            wins: 0,
            losses: 0,
        }
    }

    /// Record a validated win and move to the new rating.
    pub fn record_win(&mut self, new_rating: i32) {
        self.wins += 1;
        self.matches_played += 1;
        self.rating = new_rating;
    }

    /// Record a validated loss and move to the new rating.
    pub fn record_loss(&mut self, new_rating: i32) {
        self.losses += 1;
        self.matches_played += 1;
        self.rating = new_rating;
    }
}
