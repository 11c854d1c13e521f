//! Reported match, its format, status and contest record.

use crate::logic::RatingBreakdown;
use crate::models::error::LadderError;
use crate::models::league::FixtureId;
use crate::models::player::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Length of the match; abbreviated formats move ratings less.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFormat {
    /// Single set or match tiebreak.
    Short,
    /// Best of three sets.
    #[default]
    Standard,
    /// Best of five sets.
    Long,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Clay,
    Hard,
    Grass,
    Carpet,
    Indoor,
}

/// Validation status of a reported match. Every state but `Pending` is terminal.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
    Contested,
    AutoResolved,
}

impl MatchStatus {
    /// Rating change has been applied to the live records.
    pub fn is_validated(self) -> bool {
        matches!(self, MatchStatus::Confirmed | MatchStatus::AutoResolved)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::Rejected => "rejected",
            MatchStatus::Contested => "contested",
            MatchStatus::AutoResolved => "auto_resolved",
        };
        f.write_str(s)
    }
}

/// A request for human review of a match result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    pub by: ParticipantId,
    pub reason: String,
    pub filed_at: DateTime<Utc>,
}

/// Ratings actually written to the live records when a match was validated.
///
/// The breakdown is projected from the ratings at report time; these values
/// also reflect any other match that resolved in between.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AppliedRatings {
    pub winner_before: i32,
    pub winner_after: i32,
    pub loser_before: i32,
    pub loser_after: i32,
}

/// A singles match as reported by one of the two players.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub reported_by: ParticipantId,
    /// The non-reporting player; the only one who may confirm or reject.
    pub opponent: ParticipantId,
    pub winner: ParticipantId,
    pub score: String,
    pub format: MatchFormat,
    pub surface: Option<Surface>,
    pub notes: Option<String>,
    pub played_at: DateTime<Utc>,
    pub reported_at: DateTime<Utc>,
    /// Auto-resolution happens once this has passed while still pending.
    pub deadline: DateTime<Utc>,
    /// Projected rating change computed at report time. Never recomputed.
    pub breakdown: RatingBreakdown,
    pub status: MatchStatus,
    pub decided_at: Option<DateTime<Utc>>,
    /// None for automatic resolution.
    pub decided_by: Option<ParticipantId>,
    pub contest: Option<Contest>,
    pub fixture_id: Option<FixtureId>,
    /// Set once, when the match is confirmed or auto-resolved.
    pub applied: Option<AppliedRatings>,
}

impl Match {
    pub fn loser(&self) -> ParticipantId {
        if self.winner == self.reported_by {
            self.opponent
        } else {
            self.reported_by
        }
    }

    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.reported_by == participant || self.opponent == participant
    }

    /// Same two players, in either order.
    pub fn is_pairing(&self, a: ParticipantId, b: ParticipantId) -> bool {
        (self.reported_by == a && self.opponent == b) || (self.reported_by == b && self.opponent == a)
    }

    pub fn other_player(&self, participant: ParticipantId) -> ParticipantId {
        if self.reported_by == participant {
            self.opponent
        } else {
            self.reported_by
        }
    }

    /// Move out of `Pending`. The only place `status` changes.
    pub(crate) fn transition(
        &mut self,
        to: MatchStatus,
        by: Option<ParticipantId>,
        at: DateTime<Utc>,
    ) -> Result<(), LadderError> {
        if self.status != MatchStatus::Pending || to == MatchStatus::Pending {
            return Err(LadderError::MatchAlreadyDecided {
                id: self.id,
                status: self.status,
            });
        }
        self.status = to;
        self.decided_at = Some(at);
        self.decided_by = by;
        Ok(())
    }

    /// Validate the match and record the ratings committed for it.
    pub(crate) fn resolve(
        &mut self,
        to: MatchStatus,
        by: Option<ParticipantId>,
        at: DateTime<Utc>,
        applied: AppliedRatings,
    ) -> Result<(), LadderError> {
        self.transition(to, by, at)?;
        self.applied = Some(applied);
        Ok(())
    }
}
