//! Data structures for the ladder: participants, matches, leagues and club state.

mod club;
mod error;
mod game;
mod league;
mod player;

pub use club::{ClubState, MAX_NAME_LEN};
pub use error::{ErrorKind, LadderError};
pub use game::{
    AppliedRatings, Contest, Match, MatchFormat, MatchId, MatchStatus, Surface,
};
pub use league::{
    Fixture, FixtureId, FixtureStatus, League, LeagueId, LeagueStatus, Registration,
};
pub use player::{ClubId, Participant, ParticipantId, DEFAULT_RATING};
