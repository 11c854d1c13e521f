//! ClubState: all participants, matches, leagues and fixtures of the service.

use crate::logic::LifecyclePolicy;
use crate::logic::RatingParams;
use crate::models::error::LadderError;
use crate::models::game::{Match, MatchId};
use crate::models::league::{Fixture, FixtureId, League, LeagueId, Registration};
use crate::models::player::{ClubId, Participant, ParticipantId};
use crate::notify::Notification;
use std::collections::HashMap;

/// Longest accepted participant name.
pub const MAX_NAME_LEN: usize = 80;

/// In-memory state. Every mutation goes through `&mut ClubState`, so one write
/// lock around it makes each operation a single atomic unit.
#[derive(Clone, Debug, Default)]
pub struct ClubState {
    pub policy: LifecyclePolicy,
    pub rating_params: RatingParams,
    pub participants: HashMap<ParticipantId, Participant>,
    /// In report order.
    pub matches: Vec<Match>,
    pub leagues: HashMap<LeagueId, League>,
    pub registrations: Vec<Registration>,
    pub fixtures: Vec<Fixture>,
    /// Notifications produced by committed operations, not yet handed to delivery.
    outbox: Vec<Notification>,
}

impl ClubState {
    pub fn new(policy: LifecyclePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Add a participant to a club. Names are trimmed and must not be empty.
    pub fn add_participant(
        &mut self,
        club_id: ClubId,
        name: impl Into<String>,
    ) -> Result<ParticipantId, LadderError> {
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(LadderError::MissingField { field: "name" });
        }
        if name_trimmed.chars().count() > MAX_NAME_LEN {
            return Err(LadderError::FieldTooLong {
                field: "name",
                max: MAX_NAME_LEN,
            });
        }
        let participant = Participant::new(club_id, name_trimmed);
        let id = participant.id;
        self.participants.insert(id, participant);
        Ok(id)
    }

    pub fn participant(&self, id: ParticipantId) -> Result<&Participant, LadderError> {
        self.participants
            .get(&id)
            .ok_or(LadderError::ParticipantNotFound(id))
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Result<&mut Participant, LadderError> {
        self.participants
            .get_mut(&id)
            .ok_or(LadderError::ParticipantNotFound(id))
    }

    pub fn get_match(&self, id: MatchId) -> Result<&Match, LadderError> {
        self.matches
            .iter()
            .find(|m| m.id == id)
            .ok_or(LadderError::MatchNotFound(id))
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Result<&mut Match, LadderError> {
        self.matches
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(LadderError::MatchNotFound(id))
    }

    pub fn league(&self, id: LeagueId) -> Result<&League, LadderError> {
        self.leagues.get(&id).ok_or(LadderError::LeagueNotFound(id))
    }

    pub fn league_mut(&mut self, id: LeagueId) -> Result<&mut League, LadderError> {
        self.leagues.get_mut(&id).ok_or(LadderError::LeagueNotFound(id))
    }

    pub fn fixture(&self, id: FixtureId) -> Result<&Fixture, LadderError> {
        self.fixtures
            .iter()
            .find(|f| f.id == id)
            .ok_or(LadderError::FixtureNotFound(id))
    }

    pub fn fixture_mut(&mut self, id: FixtureId) -> Result<&mut Fixture, LadderError> {
        self.fixtures
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(LadderError::FixtureNotFound(id))
    }

    /// Registrations of one league, withdrawn ones included.
    pub fn league_registrations(&self, league_id: LeagueId) -> impl Iterator<Item = &Registration> {
        self.registrations
            .iter()
            .filter(move |r| r.league_id == league_id)
    }

    pub fn active_registrations(&self, league_id: LeagueId) -> impl Iterator<Item = &Registration> {
        self.league_registrations(league_id).filter(|r| r.active)
    }

    pub fn league_fixtures(&self, league_id: LeagueId) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(move |f| f.league_id == league_id)
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.outbox.push(notification);
    }

    /// Hand over everything queued so far.
    pub fn take_outbox(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }
}
