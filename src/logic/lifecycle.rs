//! Match results: report, then confirm / reject / contest, or auto-resolve at the deadline.
//!
//! The rating change is computed once, when the match is reported, and stored
//! on the match. Confirmation and auto-resolution both commit it through
//! [`apply_rating_change`]; nothing else touches live ratings.

use crate::logic::rating::{self, RatingInput};
use crate::logic::score::{infer_format, parse_score};
use crate::models::{
    AppliedRatings, ClubState, Contest, FixtureId, FixtureStatus, LadderError, Match, MatchFormat,
    MatchId, MatchStatus, ParticipantId, Surface,
};
use crate::notify::{Notification, NotificationEvent};
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

const MAX_SCORE_LEN: usize = 60;
const MAX_REASON_LEN: usize = 1000;

/// Limits and windows of the match lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub struct LifecyclePolicy {
    /// Time the opponent has to confirm or reject before auto-resolution.
    pub confirmation_window: Duration,
    /// Trailing window for the repetition and diversity modifiers.
    pub history_window: Duration,
    /// Contests one participant may file per calendar month.
    pub contest_monthly_cap: u32,
    pub contest_min_reason_len: usize,
    pub notes_max_len: usize,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            confirmation_window: Duration::hours(24),
            history_window: Duration::days(7),
            contest_monthly_cap: 3,
            contest_min_reason_len: 20,
            notes_max_len: 500,
        }
    }
}

/// A result as submitted by one of the two players.
#[derive(Clone, Debug, Deserialize)]
pub struct MatchReport {
    pub opponent: ParticipantId,
    pub winner: ParticipantId,
    pub score: String,
    pub format: Option<MatchFormat>,
    pub surface: Option<Surface>,
    pub notes: Option<String>,
    pub played_at: Option<DateTime<Utc>>,
    /// League fixture this match is played for.
    pub fixture_id: Option<FixtureId>,
}

/// What the non-reporting player (or, for contests, either player) decided.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Decision {
    Confirm,
    Reject,
    Contest { reason: String },
}

/// Modifier inputs derived from validated history.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HistoryInputs {
    pub new_opponent: bool,
    pub recent_pairings: u32,
    /// Includes the current opponent.
    pub weekly_opponents: u32,
}

/// Derive the pairing and diversity inputs from validated matches.
pub fn history_inputs(
    club: &ClubState,
    winner: ParticipantId,
    loser: ParticipantId,
    now: DateTime<Utc>,
) -> HistoryInputs {
    let since = now - club.policy.history_window;
    let mut new_opponent = true;
    let mut recent_pairings = 0;
    let mut opponents = HashSet::from([loser]);

    for m in club.matches.iter().filter(|m| m.status.is_validated()) {
        let recent = m.played_at >= since;
        if m.is_pairing(winner, loser) {
            new_opponent = false;
            if recent {
                recent_pairings += 1;
            }
        }
        if recent && m.involves(winner) {
            opponents.insert(m.other_player(winner));
        }
    }

    HistoryInputs {
        new_opponent,
        recent_pairings,
        weekly_opponents: opponents.len() as u32,
    }
}

/// Record a pending match and its projected rating change. Live ratings are untouched.
pub fn report_match(
    club: &mut ClubState,
    reporter: ParticipantId,
    report: MatchReport,
    now: DateTime<Utc>,
) -> Result<MatchId, LadderError> {
    let opponent = report.opponent;
    if reporter == opponent {
        return Err(LadderError::SelfMatch);
    }
    let reporter_club = club.participant(reporter)?.club_id;
    if club.participant(opponent)?.club_id != reporter_club {
        return Err(LadderError::DifferentClub);
    }
    if report.winner != reporter && report.winner != opponent {
        return Err(LadderError::InvalidWinner);
    }

    let score = report.score.trim();
    if score.is_empty() {
        return Err(LadderError::MissingField { field: "score" });
    }
    if score.chars().count() > MAX_SCORE_LEN {
        return Err(LadderError::FieldTooLong {
            field: "score",
            max: MAX_SCORE_LEN,
        });
    }
    let notes = report
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if let Some(n) = &notes {
        if n.chars().count() > club.policy.notes_max_len {
            return Err(LadderError::FieldTooLong {
                field: "notes",
                max: club.policy.notes_max_len,
            });
        }
    }
    let played_at = report.played_at.unwrap_or(now);
    if played_at > now {
        return Err(LadderError::PlayedInFuture);
    }
    if let Some(pending) = club
        .matches
        .iter()
        .find(|m| m.status == MatchStatus::Pending && m.is_pairing(reporter, opponent))
    {
        return Err(LadderError::DuplicatePending(pending.id));
    }
    if let Some(fixture_id) = report.fixture_id {
        let fixture = club.fixture(fixture_id)?;
        if !fixture.is_pairing(reporter, opponent) {
            return Err(LadderError::FixtureMismatch);
        }
        if fixture.status != FixtureStatus::Open {
            return Err(LadderError::FixtureClosed(fixture_id));
        }
    }

    let winner = report.winner;
    let loser = if winner == reporter { opponent } else { reporter };
    let winner_record = club.participant(winner)?;
    let loser_record = club.participant(loser)?;
    let parsed = parse_score(score);
    let format = report.format.unwrap_or_else(|| infer_format(parsed.as_ref()));
    let history = history_inputs(club, winner, loser, now);
    let input = RatingInput {
        winner_rating: winner_record.rating,
        loser_rating: loser_record.rating,
        winner_matches: winner_record.matches_played,
        loser_matches: loser_record.matches_played,
        format,
        winner_games: parsed.map_or(0, |s| s.winner_games),
        loser_games: parsed.map_or(0, |s| s.loser_games),
        new_opponent: history.new_opponent,
        recent_pairings: history.recent_pairings,
        weekly_opponents: history.weekly_opponents,
    };
    let breakdown = rating::calculate(&input, &club.rating_params);
    if parsed.is_none() {
        log::warn!("Unparseable score {score:?} from {reporter}; margin modifier neutralised");
    }

    let deadline = now + club.policy.confirmation_window;
    let m = Match {
        id: Uuid::new_v4(),
        reported_by: reporter,
        opponent,
        winner,
        score: score.to_string(),
        format,
        surface: report.surface,
        notes,
        played_at,
        reported_at: now,
        deadline,
        breakdown,
        status: MatchStatus::Pending,
        decided_at: None,
        decided_by: None,
        contest: None,
        fixture_id: report.fixture_id,
        applied: None,
    };
    let id = m.id;
    club.notify(Notification::new(
        opponent,
        NotificationEvent::MatchReported {
            match_id: id,
            reported_by: reporter,
            winner,
            score: m.score.clone(),
            deadline,
        },
    ));
    club.matches.push(m);
    log::info!("Match {id} reported by {reporter} against {opponent}, due {deadline}");
    Ok(id)
}

/// Dispatch a decision from the match decision API.
pub fn decide_match(
    club: &mut ClubState,
    match_id: MatchId,
    caller: ParticipantId,
    decision: &Decision,
    now: DateTime<Utc>,
) -> Result<(), LadderError> {
    match decision {
        Decision::Confirm => confirm_match(club, match_id, caller, now),
        Decision::Reject => reject_match(club, match_id, caller, now),
        Decision::Contest { reason } => contest_match(club, match_id, caller, reason, now),
    }
}

/// Opponent accepts the reported result; the rating change is committed.
pub fn confirm_match(
    club: &mut ClubState,
    match_id: MatchId,
    caller: ParticipantId,
    now: DateTime<Utc>,
) -> Result<(), LadderError> {
    if club.get_match(match_id)?.opponent != caller {
        return Err(LadderError::NotOpponent { action: "confirm" });
    }
    apply_rating_change(club, match_id, Some(caller), now)
}

/// Opponent disputes the reported result; the match is discarded.
pub fn reject_match(
    club: &mut ClubState,
    match_id: MatchId,
    caller: ParticipantId,
    now: DateTime<Utc>,
) -> Result<(), LadderError> {
    let m = club.get_match_mut(match_id)?;
    if m.opponent != caller {
        return Err(LadderError::NotOpponent { action: "reject" });
    }
    m.transition(MatchStatus::Rejected, Some(caller), now)?;
    let reporter = m.reported_by;
    club.notify(Notification::new(
        reporter,
        NotificationEvent::MatchRejected {
            match_id,
            rejected_by: caller,
        },
    ));
    log::info!("Match {match_id} rejected by {caller}");
    Ok(())
}

/// Flag a pending or validated match for moderation. Ratings are not changed.
pub fn contest_match(
    club: &mut ClubState,
    match_id: MatchId,
    caller: ParticipantId,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), LadderError> {
    let cap = club.policy.contest_monthly_cap;
    let min = club.policy.contest_min_reason_len;
    let m = club.get_match(match_id)?;
    if !m.involves(caller) {
        return Err(LadderError::NotParticipant);
    }
    if m.contest.is_some() {
        return Err(LadderError::AlreadyContested(match_id));
    }
    if !(m.status == MatchStatus::Pending || m.status.is_validated()) {
        return Err(LadderError::MatchAlreadyDecided {
            id: match_id,
            status: m.status,
        });
    }
    let reason = reason.trim();
    if reason.chars().count() < min {
        return Err(LadderError::ReasonTooShort { min });
    }
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(LadderError::FieldTooLong {
            field: "reason",
            max: MAX_REASON_LEN,
        });
    }
    let filed_this_month = club
        .matches
        .iter()
        .filter_map(|m| m.contest.as_ref())
        .filter(|c| c.by == caller && c.filed_at.year() == now.year() && c.filed_at.month() == now.month())
        .count();
    if filed_this_month >= cap as usize {
        return Err(LadderError::ContestLimitReached { cap });
    }

    let other = m.other_player(caller);
    let m = club.get_match_mut(match_id)?;
    if m.status == MatchStatus::Pending {
        m.transition(MatchStatus::Contested, Some(caller), now)?;
    }
    m.contest = Some(Contest {
        by: caller,
        reason: reason.to_string(),
        filed_at: now,
    });
    club.notify(Notification::new(
        other,
        NotificationEvent::MatchContested {
            match_id,
            contested_by: caller,
            reason: reason.to_string(),
        },
    ));
    log::info!("Match {match_id} contested by {caller}");
    Ok(())
}

/// Commit a pending match whose confirmation deadline has passed.
pub fn auto_resolve_match(
    club: &mut ClubState,
    match_id: MatchId,
    now: DateTime<Utc>,
) -> Result<(), LadderError> {
    if club.get_match(match_id)?.deadline > now {
        return Err(LadderError::DeadlineNotReached(match_id));
    }
    apply_rating_change(club, match_id, None, now)
}

/// Apply the stored rating change to both live records, close the match and
/// its fixture. `by` is the confirming player, or None for auto-resolution.
///
/// Every lookup happens before the first write, so either everything is
/// applied or nothing is.
fn apply_rating_change(
    club: &mut ClubState,
    match_id: MatchId,
    by: Option<ParticipantId>,
    now: DateTime<Utc>,
) -> Result<(), LadderError> {
    let m = club.get_match(match_id)?;
    if m.status != MatchStatus::Pending {
        return Err(LadderError::MatchAlreadyDecided {
            id: match_id,
            status: m.status,
        });
    }
    let (winner, loser) = (m.winner, m.loser());
    let (winner_delta, loser_delta) = (m.breakdown.winner_delta, m.breakdown.loser_delta);
    let fixture_id = m.fixture_id;

    let winner_before = club.participant(winner)?.rating;
    let loser_before = club.participant(loser)?.rating;
    if let Some(fixture_id) = fixture_id {
        club.fixture(fixture_id)?;
    }
    let winner_after = winner_before + winner_delta;
    let loser_after = rating::clamp_rating(loser_before + loser_delta, &club.rating_params);

    let status = if by.is_some() {
        MatchStatus::Confirmed
    } else {
        MatchStatus::AutoResolved
    };
    let applied = AppliedRatings {
        winner_before,
        winner_after,
        loser_before,
        loser_after,
    };
    club.get_match_mut(match_id)?.resolve(status, by, now, applied)?;
    club.participant_mut(winner)?.record_win(winner_after);
    club.participant_mut(loser)?.record_loss(loser_after);
    if let Some(fixture_id) = fixture_id {
        let fixture = club.fixture_mut(fixture_id)?;
        if fixture.status == FixtureStatus::Open {
            fixture.status = FixtureStatus::Played { match_id };
        }
    }

    for (recipient, before, after) in [
        (winner, winner_before, winner_after),
        (loser, loser_before, loser_after),
    ] {
        let event = match status {
            MatchStatus::AutoResolved => NotificationEvent::MatchAutoResolved {
                match_id,
                rating_before: before,
                rating_after: after,
            },
            _ => NotificationEvent::MatchConfirmed {
                match_id,
                rating_before: before,
                rating_after: after,
            },
        };
        club.notify(Notification::new(recipient, event));
    }
    log::info!(
        "Match {match_id} {status}: {winner} {winner_before}->{winner_after}, {loser} {loser_before}->{loser_after}"
    );
    Ok(())
}
