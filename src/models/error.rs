//! Errors raised by ladder operations.

use crate::models::game::{MatchId, MatchStatus};
use crate::models::league::{FixtureId, LeagueId, LeagueStatus};
use crate::models::player::ParticipantId;
use thiserror::Error;

/// Broad classification used by the HTTP layer and the sweep summary.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad input; nothing was mutated.
    Validation,
    /// Caller is not allowed to perform this action on this match.
    Forbidden,
    NotFound,
    /// An idempotency guard tripped (already decided, already drawn, ...).
    Conflict,
    RateLimited,
    Internal,
}

/// Errors that can occur during ladder operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LadderError {
    #[error("Participant {0} not found")]
    ParticipantNotFound(ParticipantId),
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    #[error("League {0} not found")]
    LeagueNotFound(LeagueId),
    #[error("Fixture {0} not found")]
    FixtureNotFound(FixtureId),
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} is too long (max {max} characters)")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("Cannot report a match against yourself")]
    SelfMatch,
    #[error("Opponent is not a member of the same club")]
    DifferentClub,
    #[error("Winner must be one of the two players")]
    InvalidWinner,
    #[error("A match cannot be played in the future")]
    PlayedInFuture,
    #[error("A pending match between these players already exists ({0})")]
    DuplicatePending(MatchId),
    #[error("Fixture does not belong to these players")]
    FixtureMismatch,
    #[error("Fixture {0} has already been played")]
    FixtureClosed(FixtureId),
    #[error("Invalid league settings: {0}")]
    InvalidLeague(&'static str),
    #[error("Only the opponent of the reporting player may {action} this match")]
    NotOpponent { action: &'static str },
    #[error("Only the players of a match may contest it")]
    NotParticipant,
    #[error("Participants can only withdraw themselves")]
    NotSelf,
    #[error("Match {id} is already {status}")]
    MatchAlreadyDecided { id: MatchId, status: MatchStatus },
    #[error("Match {0} has not reached its confirmation deadline")]
    DeadlineNotReached(MatchId),
    #[error("Match {0} has already been contested")]
    AlreadyContested(MatchId),
    #[error("Contest reason must be at least {min} characters")]
    ReasonTooShort { min: usize },
    #[error("Monthly contest limit of {cap} reached")]
    ContestLimitReached { cap: u32 },
    #[error("League cannot move from {from} to {to}")]
    InvalidLeagueTransition { from: LeagueStatus, to: LeagueStatus },
    #[error("Registration for this league is closed")]
    RegistrationClosed,
    #[error("Registration deadline has not passed yet")]
    RegistrationStillOpen,
    #[error("League is full")]
    LeagueFull,
    #[error("Participant is already registered")]
    AlreadyRegistered,
    #[error("Participant is not registered")]
    NotRegistered,
    #[error("Groups for league {0} have already been drawn")]
    GroupsAlreadyDrawn(LeagueId),
    #[error("Too many requests, try again in a minute")]
    RateLimited,
    #[error("State lock poisoned")]
    LockPoisoned,
}

impl LadderError {
    pub fn kind(&self) -> ErrorKind {
        use LadderError::*;
        match self {
            ParticipantNotFound(_) | MatchNotFound(_) | LeagueNotFound(_) | FixtureNotFound(_) => {
                ErrorKind::NotFound
            }
            NotOpponent { .. } | NotParticipant | NotSelf => ErrorKind::Forbidden,
            DuplicatePending(_)
            | FixtureClosed(_)
            | MatchAlreadyDecided { .. }
            | DeadlineNotReached(_)
            | AlreadyContested(_)
            | InvalidLeagueTransition { .. }
            | RegistrationClosed
            | RegistrationStillOpen
            | LeagueFull
            | AlreadyRegistered
            | GroupsAlreadyDrawn(_) => ErrorKind::Conflict,
            RateLimited | ContestLimitReached { .. } => ErrorKind::RateLimited,
            LockPoisoned => ErrorKind::Internal,
            MissingField { .. }
            | FieldTooLong { .. }
            | SelfMatch
            | DifferentClub
            | InvalidWinner
            | PlayedInFuture
            | FixtureMismatch
            | InvalidLeague(_)
            | ReasonTooShort { .. }
            | NotRegistered => ErrorKind::Validation,
        }
    }
}
