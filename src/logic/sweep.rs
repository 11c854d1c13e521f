//! Out-of-band sweep: auto-resolve overdue matches and draw closed leagues.
//!
//! Each unit of work takes the write lock on its own and re-checks its status
//! before mutating, so overlapping sweeps (a retry after a timeout, say) only
//! ever see a unit once. A failing unit is recorded and the sweep moves on.

use crate::clock::Clock;
use crate::logic::league_formation::{form_league, FormationOutcome};
use crate::logic::lifecycle::auto_resolve_match;
use crate::models::{
    ClubState, ErrorKind, LadderError, LeagueId, LeagueStatus, MatchId, MatchStatus,
};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::RwLock;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LeagueSweepResult {
    Started { group_count: u32, fixtures: usize },
    Cancelled { registrants: usize },
    /// Already handled by an overlapping sweep.
    Skipped { reason: String },
    Error { message: String },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchSweepResult {
    AutoResolved,
    Skipped { reason: String },
    Error { message: String },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LeagueSweepOutcome {
    pub league_id: LeagueId,
    #[serde(flatten)]
    pub result: LeagueSweepResult,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchSweepOutcome {
    pub match_id: MatchId,
    #[serde(flatten)]
    pub result: MatchSweepResult,
}

/// What one sweep did.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SweepSummary {
    pub ran_at: Option<DateTime<Utc>>,
    pub leagues_started: usize,
    pub leagues_cancelled: usize,
    pub leagues_skipped: usize,
    pub leagues_errored: usize,
    pub matches_auto_resolved: usize,
    pub matches_skipped: usize,
    pub matches_errored: usize,
    pub leagues: Vec<LeagueSweepOutcome>,
    pub matches: Vec<MatchSweepOutcome>,
}

/// A league still waiting for its draw.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PendingLeague {
    pub league_id: LeagueId,
    pub name: String,
    pub registration_deadline: DateTime<Utc>,
    pub deadline_passed: bool,
    pub active_registrants: usize,
}

/// Read-only view for operators.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SweepStatus {
    pub checked_at: DateTime<Utc>,
    pub pending_leagues: Vec<PendingLeague>,
    pub pending_matches: usize,
    pub overdue_matches: usize,
}

/// Pending matches past their deadline, oldest deadline first.
pub fn overdue_matches(club: &ClubState, now: DateTime<Utc>) -> Vec<MatchId> {
    let mut overdue: Vec<_> = club
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Pending && m.deadline <= now)
        .map(|m| (m.deadline, m.id))
        .collect();
    overdue.sort();
    overdue.into_iter().map(|(_, id)| id).collect()
}

/// Leagues in registration whose deadline has passed, earliest deadline first.
pub fn leagues_due(club: &ClubState, now: DateTime<Utc>) -> Vec<LeagueId> {
    let mut due: Vec<_> = club
        .leagues
        .values()
        .filter(|l| {
            l.status == LeagueStatus::Registration
                && !l.groups_drawn()
                && l.registration_deadline <= now
        })
        .map(|l| (l.registration_deadline, l.id))
        .collect();
    due.sort();
    due.into_iter().map(|(_, id)| id).collect()
}

pub fn sweep_status(club: &ClubState, now: DateTime<Utc>) -> SweepStatus {
    let mut pending_leagues: Vec<PendingLeague> = club
        .leagues
        .values()
        .filter(|l| l.status == LeagueStatus::Registration)
        .map(|l| PendingLeague {
            league_id: l.id,
            name: l.name.clone(),
            registration_deadline: l.registration_deadline,
            deadline_passed: l.registration_deadline <= now,
            active_registrants: club.active_registrations(l.id).count(),
        })
        .collect();
    pending_leagues.sort_by_key(|l| (l.registration_deadline, l.league_id));

    let pending_matches = club
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Pending)
        .count();

    SweepStatus {
        checked_at: now,
        pending_leagues,
        pending_matches,
        overdue_matches: overdue_matches(club, now).len(),
    }
}

/// Run one sweep against shared state. Matches are resolved before leagues are drawn.
pub fn run_sweep<R: Rng + ?Sized>(
    state: &RwLock<ClubState>,
    clock: &dyn Clock,
    rng: &mut R,
) -> Result<SweepSummary, LadderError> {
    let now = clock.now();
    let (match_ids, league_ids) = {
        let club = state.read().map_err(|_| LadderError::LockPoisoned)?;
        (overdue_matches(&club, now), leagues_due(&club, now))
    };
    log::info!(
        "Sweep at {now}: {} overdue match(es), {} league(s) due",
        match_ids.len(),
        league_ids.len()
    );

    let mut summary = SweepSummary {
        ran_at: Some(now),
        ..SweepSummary::default()
    };

    for match_id in match_ids {
        let result = match with_unit(state, |club| auto_resolve_match(club, match_id, now)) {
            Ok(()) => {
                summary.matches_auto_resolved += 1;
                MatchSweepResult::AutoResolved
            }
            Err(e) if e.kind() == ErrorKind::Conflict => {
                summary.matches_skipped += 1;
                MatchSweepResult::Skipped {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                log::warn!("Auto-resolution of match {match_id} failed: {e}");
                summary.matches_errored += 1;
                MatchSweepResult::Error {
                    message: e.to_string(),
                }
            }
        };
        summary.matches.push(MatchSweepOutcome { match_id, result });
    }

    for league_id in league_ids {
        let result = match with_unit(state, |club| form_league(club, league_id, now, rng)) {
            Ok(FormationOutcome::Started {
                group_count,
                fixtures,
                ..
            }) => {
                summary.leagues_started += 1;
                LeagueSweepResult::Started {
                    group_count,
                    fixtures,
                }
            }
            Ok(FormationOutcome::Cancelled { registrants }) => {
                summary.leagues_cancelled += 1;
                LeagueSweepResult::Cancelled { registrants }
            }
            Err(e) if e.kind() == ErrorKind::Conflict => {
                summary.leagues_skipped += 1;
                LeagueSweepResult::Skipped {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                log::warn!("Formation of league {league_id} failed: {e}");
                summary.leagues_errored += 1;
                LeagueSweepResult::Error {
                    message: e.to_string(),
                }
            }
        };
        summary.leagues.push(LeagueSweepOutcome { league_id, result });
    }

    log::info!(
        "Sweep done: {} resolved, {} started, {} cancelled, {} errored",
        summary.matches_auto_resolved,
        summary.leagues_started,
        summary.leagues_cancelled,
        summary.matches_errored + summary.leagues_errored
    );
    Ok(summary)
}

/// Run one unit of work under its own write lock.
fn with_unit<T>(
    state: &RwLock<ClubState>,
    unit: impl FnOnce(&mut ClubState) -> Result<T, LadderError>,
) -> Result<T, LadderError> {
    let mut club = state.write().map_err(|_| {
        log::error!("Club state lock poisoned");
        LadderError::LockPoisoned
    })?;
    unit(&mut club)
}
