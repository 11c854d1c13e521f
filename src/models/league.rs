//! Box league, registrations and generated fixtures.

use crate::models::error::LadderError;
use crate::models::game::MatchId;
use crate::models::player::{ClubId, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a league.
pub type LeagueId = Uuid;

/// Unique identifier for a generated fixture.
pub type FixtureId = Uuid;

/// Current phase of the league.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    /// Created by an organiser; not yet open.
    #[default]
    Draft,
    /// Accepting registrations until the deadline.
    Registration,
    /// Groups drawn and fixtures generated.
    Active,
    Completed,
    /// Not enough registrants at the deadline.
    Cancelled,
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeagueStatus::Draft => "draft",
            LeagueStatus::Registration => "registration",
            LeagueStatus::Active => "active",
            LeagueStatus::Completed => "completed",
            LeagueStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A box-style round-robin competition inside one club.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub club_id: ClubId,
    pub name: String,
    /// Maximum number of active registrations.
    pub capacity: u32,
    /// Group count configured by the organiser (upper bound).
    pub requested_group_count: u32,
    pub target_group_size: u32,
    /// Group count actually used; set by the draw.
    pub group_count: u32,
    pub registration_deadline: DateTime<Utc>,
    /// Deadline of every generated fixture.
    pub end_date: DateTime<Utc>,
    pub status: LeagueStatus,
    pub drawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl League {
    pub fn groups_drawn(&self) -> bool {
        matches!(self.status, LeagueStatus::Active | LeagueStatus::Completed)
    }

    /// Move forward along draft -> registration -> active -> completed,
    /// or registration -> cancelled. The only place `status` changes.
    pub(crate) fn transition(&mut self, to: LeagueStatus) -> Result<(), LadderError> {
        use LeagueStatus::*;
        let allowed = matches!(
            (self.status, to),
            (Draft, Registration) | (Registration, Active) | (Registration, Cancelled) | (Active, Completed)
        );
        if !allowed {
            if to == Active && self.groups_drawn() {
                return Err(LadderError::GroupsAlreadyDrawn(self.id));
            }
            return Err(LadderError::InvalidLeagueTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// A participant's entry in a league.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub league_id: LeagueId,
    pub participant_id: ParticipantId,
    /// Rating at registration time.
    pub rating_snapshot: i32,
    /// 1-based group number; None until the draw.
    pub group: Option<u32>,
    /// False once withdrawn.
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FixtureStatus {
    Open,
    Played { match_id: MatchId },
}

/// A scheduled league match between two members of the same group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub league_id: LeagueId,
    pub group: u32,
    pub home: ParticipantId,
    pub away: ParticipantId,
    pub deadline: DateTime<Utc>,
    pub status: FixtureStatus,
}

impl Fixture {
    pub fn new(
        league_id: LeagueId,
        group: u32,
        home: ParticipantId,
        away: ParticipantId,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            league_id,
            group,
            home,
            away,
            deadline,
            status: FixtureStatus::Open,
        }
    }

    /// Same two players, in either order.
    pub fn is_pairing(&self, a: ParticipantId, b: ParticipantId) -> bool {
        (self.home == a && self.away == b) || (self.home == b && self.away == a)
    }

    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.home == participant || self.away == participant
    }
}
