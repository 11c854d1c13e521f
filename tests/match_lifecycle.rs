//! Integration tests for reporting, confirming, rejecting and contesting matches.

use chrono::{DateTime, Duration, TimeZone, Utc};
use club_ladder::{
    auto_resolve_match, confirm_match, contest_match, decide_match, reject_match, report_match,
    ClubState, Decision, LadderError, LifecyclePolicy, MatchFormat, MatchReport, MatchStatus,
    NotificationEvent, ParticipantId,
};
use club_ladder::logic::history_inputs;
use uuid::Uuid;

const REASON: &str = "Score was entered the wrong way round";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 18, 0, 0).unwrap()
}

fn club_with_players(n: usize) -> (ClubState, Vec<ParticipantId>) {
    let mut club = ClubState::new(LifecyclePolicy::default());
    let club_id = Uuid::new_v4();
    let ids = (0..n)
        .map(|i| club.add_participant(club_id, format!("Player {i}")).unwrap())
        .collect();
    (club, ids)
}

fn report(opponent: ParticipantId, winner: ParticipantId, score: &str) -> MatchReport {
    MatchReport {
        opponent,
        winner,
        score: score.to_string(),
        format: None,
        surface: None,
        notes: None,
        played_at: None,
        fixture_id: None,
    }
}

#[test]
fn report_leaves_ratings_untouched() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-3"), t0()).unwrap();

    let m = club.get_match(id).unwrap();
    assert_eq!(m.status, MatchStatus::Pending);
    assert_eq!(m.deadline, t0() + Duration::hours(24));
    assert_eq!(m.format, MatchFormat::Standard);
    assert!(m.breakdown.winner_delta > 0);
    assert_eq!(club.participant(p[0]).unwrap().rating, 1000);
    assert_eq!(club.participant(p[1]).unwrap().matches_played, 0);

    let outbox = club.take_outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].recipient, p[1]);
    assert!(matches!(outbox[0].event, NotificationEvent::MatchReported { .. }));
}

#[test]
fn report_validation() {
    let (mut club, p) = club_with_players(3);
    let other_club = club.add_participant(Uuid::new_v4(), "Visitor").unwrap();

    assert_eq!(
        report_match(&mut club, p[0], report(p[0], p[0], "6-0 6-0"), t0()),
        Err(LadderError::SelfMatch)
    );
    assert_eq!(
        report_match(&mut club, p[0], report(other_club, p[0], "6-0 6-0"), t0()),
        Err(LadderError::DifferentClub)
    );
    assert_eq!(
        report_match(&mut club, p[0], report(p[1], p[2], "6-0 6-0"), t0()),
        Err(LadderError::InvalidWinner)
    );
    assert_eq!(
        report_match(&mut club, p[0], report(p[1], p[0], "   "), t0()),
        Err(LadderError::MissingField { field: "score" })
    );
    assert!(matches!(
        report_match(&mut club, p[0], report(Uuid::new_v4(), p[0], "6-0"), t0()),
        Err(LadderError::ParticipantNotFound(_))
    ));

    let mut future = report(p[1], p[0], "6-0 6-0");
    future.played_at = Some(t0() + Duration::hours(1));
    assert_eq!(
        report_match(&mut club, p[0], future, t0()),
        Err(LadderError::PlayedInFuture)
    );

    let mut chatty = report(p[1], p[0], "6-0 6-0");
    chatty.notes = Some("x".repeat(501));
    assert_eq!(
        report_match(&mut club, p[0], chatty, t0()),
        Err(LadderError::FieldTooLong {
            field: "notes",
            max: 500
        })
    );
    assert!(club.matches.is_empty());
}

#[test]
fn second_pending_report_for_same_pair_is_rejected() {
    let (mut club, p) = club_with_players(2);
    let first = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    assert_eq!(
        report_match(&mut club, p[1], report(p[0], p[1], "6-4 6-4"), t0()),
        Err(LadderError::DuplicatePending(first))
    );
}

#[test]
fn unparseable_score_degrades_margin() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[1], "won easily"), t0()).unwrap();
    let m = club.get_match(id).unwrap();
    assert!(m.breakdown.margin.degraded);
    assert_eq!(m.winner, p[1]);
    assert_eq!(m.loser(), p[0]);
}

#[test]
fn confirm_applies_stored_change() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    club.take_outbox();
    let breakdown = club.get_match(id).unwrap().breakdown.clone();

    confirm_match(&mut club, id, p[1], t0() + Duration::hours(2)).unwrap();

    let winner = club.participant(p[0]).unwrap();
    assert_eq!(winner.rating, 1000 + breakdown.winner_delta);
    assert_eq!((winner.wins, winner.losses, winner.matches_played), (1, 0, 1));
    let loser = club.participant(p[1]).unwrap();
    assert_eq!(loser.rating, 1000 + breakdown.loser_delta);
    assert_eq!((loser.wins, loser.losses, loser.matches_played), (0, 1, 1));

    let m = club.get_match(id).unwrap();
    assert_eq!(m.status, MatchStatus::Confirmed);
    assert_eq!(m.decided_by, Some(p[1]));
    assert_eq!(club.take_outbox().len(), 2);
}

#[test]
fn only_the_opponent_may_confirm_or_reject() {
    let (mut club, p) = club_with_players(3);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    assert_eq!(
        confirm_match(&mut club, id, p[0], t0()),
        Err(LadderError::NotOpponent { action: "confirm" })
    );
    assert_eq!(
        reject_match(&mut club, id, p[2], t0()),
        Err(LadderError::NotOpponent { action: "reject" })
    );
    assert_eq!(club.get_match(id).unwrap().status, MatchStatus::Pending);
}

#[test]
fn second_confirmation_changes_nothing() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    confirm_match(&mut club, id, p[1], t0()).unwrap();
    let before = club.participants.clone();

    assert_eq!(
        confirm_match(&mut club, id, p[1], t0()),
        Err(LadderError::MatchAlreadyDecided {
            id,
            status: MatchStatus::Confirmed
        })
    );
    assert_eq!(
        auto_resolve_match(&mut club, id, t0() + Duration::days(2)),
        Err(LadderError::MatchAlreadyDecided {
            id,
            status: MatchStatus::Confirmed
        })
    );
    assert_eq!(club.participants, before);
}

#[test]
fn reject_discards_without_rating_change() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    club.take_outbox();
    decide_match(&mut club, id, p[1], &Decision::Reject, t0()).unwrap();

    assert_eq!(club.get_match(id).unwrap().status, MatchStatus::Rejected);
    assert_eq!(club.participant(p[0]).unwrap().rating, 1000);
    let outbox = club.take_outbox();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].recipient, p[0]);

    // A fresh report is allowed once the earlier one is closed.
    assert!(report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-3"), t0()).is_ok());
}

#[test]
fn contesting_a_pending_match_closes_it() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    contest_match(&mut club, id, p[1], REASON, t0()).unwrap();

    let m = club.get_match(id).unwrap();
    assert_eq!(m.status, MatchStatus::Contested);
    assert_eq!(m.contest.as_ref().map(|c| c.by), Some(p[1]));
    assert!(matches!(
        confirm_match(&mut club, id, p[1], t0()),
        Err(LadderError::MatchAlreadyDecided { .. })
    ));
    assert_eq!(club.participant(p[0]).unwrap().rating, 1000);
}

#[test]
fn contesting_a_confirmed_match_keeps_its_ratings() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    confirm_match(&mut club, id, p[1], t0()).unwrap();
    let rating = club.participant(p[0]).unwrap().rating;

    contest_match(&mut club, id, p[0], REASON, t0()).unwrap();
    let m = club.get_match(id).unwrap();
    assert_eq!(m.status, MatchStatus::Confirmed);
    assert!(m.contest.is_some());
    assert_eq!(club.participant(p[0]).unwrap().rating, rating);

    assert_eq!(
        contest_match(&mut club, id, p[1], REASON, t0()),
        Err(LadderError::AlreadyContested(id))
    );
}

#[test]
fn contest_rules() {
    let (mut club, p) = club_with_players(3);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    assert_eq!(
        contest_match(&mut club, id, p[2], REASON, t0()),
        Err(LadderError::NotParticipant)
    );
    assert_eq!(
        contest_match(&mut club, id, p[1], "wrong", t0()),
        Err(LadderError::ReasonTooShort { min: 20 })
    );

    reject_match(&mut club, id, p[1], t0()).unwrap();
    assert!(matches!(
        contest_match(&mut club, id, p[0], REASON, t0()),
        Err(LadderError::MatchAlreadyDecided {
            status: MatchStatus::Rejected,
            ..
        })
    ));
}

#[test]
fn monthly_contest_cap() {
    let (mut club, p) = club_with_players(6);
    let mut now = t0();
    for opponent in &p[1..4] {
        let id = report_match(&mut club, p[0], report(*opponent, p[0], "6-4 6-4"), now).unwrap();
        contest_match(&mut club, id, p[0], REASON, now).unwrap();
        now += Duration::hours(1);
    }
    let id = report_match(&mut club, p[0], report(p[4], p[0], "6-4 6-4"), now).unwrap();
    assert_eq!(
        contest_match(&mut club, id, p[0], REASON, now),
        Err(LadderError::ContestLimitReached { cap: 3 })
    );
    // The opponent has their own allowance.
    assert!(contest_match(&mut club, id, p[4], REASON, now).is_ok());

    // A new calendar month resets the count.
    let next_month = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
    let id = report_match(&mut club, p[0], report(p[5], p[0], "6-4 6-4"), next_month).unwrap();
    assert!(contest_match(&mut club, id, p[0], REASON, next_month).is_ok());
}

#[test]
fn auto_resolution_waits_for_deadline() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    assert_eq!(
        auto_resolve_match(&mut club, id, t0() + Duration::hours(23)),
        Err(LadderError::DeadlineNotReached(id))
    );
    auto_resolve_match(&mut club, id, t0() + Duration::hours(24)).unwrap();
    let m = club.get_match(id).unwrap();
    assert_eq!(m.status, MatchStatus::AutoResolved);
    assert_eq!(m.decided_by, None);
}

#[test]
fn repeated_pairing_earns_less() {
    let (mut club, p) = club_with_players(2);
    let first = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    confirm_match(&mut club, first, p[1], t0()).unwrap();

    let later = t0() + Duration::hours(3);
    let second = report_match(&mut club, p[1], report(p[0], p[1], "6-4 6-4"), later).unwrap();
    let b = &club.get_match(second).unwrap().breakdown;
    assert!(!b.new_opponent_bonus.applied);
    assert!(b.repetition_malus.applied);
    assert_eq!(b.repetition_malus.value, 0.75);
}

#[test]
fn overlapping_matches_record_the_ratings_applied() {
    let (mut club, p) = club_with_players(3);
    let first = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    let second = report_match(&mut club, p[0], report(p[2], p[0], "6-4 6-4"), t0()).unwrap();
    assert_eq!(club.get_match(first).unwrap().applied, None);

    confirm_match(&mut club, second, p[2], t0() + Duration::hours(1)).unwrap();
    confirm_match(&mut club, first, p[1], t0() + Duration::hours(2)).unwrap();

    let second_applied = club.get_match(second).unwrap().applied.unwrap();
    let m = club.get_match(first).unwrap();
    let applied = m.applied.unwrap();
    // Projected from 1000; applied on top of the rating the other match produced.
    assert_eq!(m.breakdown.winner_rating_before, 1000);
    assert_eq!(applied.winner_before, second_applied.winner_after);
    assert_eq!(applied.winner_after, applied.winner_before + m.breakdown.winner_delta);
    assert_eq!(applied.winner_after, club.participant(p[0]).unwrap().rating);
    assert_eq!(applied.loser_after, club.participant(p[1]).unwrap().rating);
    assert_eq!(second_applied.loser_after, club.participant(p[2]).unwrap().rating);
}

#[test]
fn auto_resolution_records_the_ratings_applied() {
    let (mut club, p) = club_with_players(2);
    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    auto_resolve_match(&mut club, id, t0() + Duration::hours(25)).unwrap();
    let applied = club.get_match(id).unwrap().applied.unwrap();
    assert_eq!(applied.winner_before, 1000);
    assert_eq!(applied.winner_after, club.participant(p[0]).unwrap().rating);
    assert_eq!(applied.loser_after, club.participant(p[1]).unwrap().rating);
}

/// `p[0]` beats `p[1]` and `p[2]`, both confirmed at `t0`.
fn club_with_two_weekly_wins() -> (ClubState, Vec<ParticipantId>) {
    let (mut club, p) = club_with_players(5);
    for opponent in [p[1], p[2]] {
        let id = report_match(&mut club, p[0], report(opponent, p[0], "6-4 6-4"), t0()).unwrap();
        confirm_match(&mut club, id, opponent, t0()).unwrap();
    }
    (club, p)
}

#[test]
fn third_weekly_opponent_earns_diversity_bonus() {
    let (mut club, p) = club_with_two_weekly_wins();
    let now = t0() + Duration::days(2);
    assert_eq!(history_inputs(&club, p[0], p[3], now).weekly_opponents, 3);

    let id = report_match(&mut club, p[0], report(p[3], p[0], "6-4 6-4"), now).unwrap();
    let b = &club.get_match(id).unwrap().breakdown;
    assert!(b.diversity_bonus.applied);
    assert!(b.new_opponent_bonus.applied);
}

#[test]
fn diversity_only_counts_the_trailing_week() {
    let (mut club, p) = club_with_two_weekly_wins();
    let now = t0() + Duration::days(8);
    assert_eq!(history_inputs(&club, p[0], p[3], now).weekly_opponents, 1);

    let id = report_match(&mut club, p[0], report(p[3], p[0], "6-4 6-4"), now).unwrap();
    assert!(!club.get_match(id).unwrap().breakdown.diversity_bonus.applied);
}

#[test]
fn unvalidated_matches_do_not_count_as_history() {
    let (mut club, p) = club_with_players(5);
    let confirmed = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    confirm_match(&mut club, confirmed, p[1], t0()).unwrap();
    // Still pending.
    report_match(&mut club, p[0], report(p[2], p[0], "6-4 6-4"), t0()).unwrap();
    let rejected = report_match(&mut club, p[0], report(p[4], p[0], "6-4 6-4"), t0()).unwrap();
    reject_match(&mut club, rejected, p[4], t0()).unwrap();

    let now = t0() + Duration::hours(3);
    let history = history_inputs(&club, p[0], p[3], now);
    assert_eq!(history.weekly_opponents, 2);
    // Never validated against p[4], so still a new opponent.
    assert!(history_inputs(&club, p[0], p[4], now).new_opponent);

    let id = report_match(&mut club, p[0], report(p[3], p[0], "6-4 6-4"), now).unwrap();
    assert!(!club.get_match(id).unwrap().breakdown.diversity_bonus.applied);
}

#[test]
fn repetition_malus_expires_after_a_week() {
    let (mut club, p) = club_with_players(2);
    let first = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), t0()).unwrap();
    confirm_match(&mut club, first, p[1], t0()).unwrap();

    let inside = history_inputs(&club, p[0], p[1], t0() + Duration::days(6));
    assert_eq!(inside.recent_pairings, 1);
    assert!(!inside.new_opponent);

    let later = t0() + Duration::days(8);
    let outside = history_inputs(&club, p[0], p[1], later);
    assert_eq!(outside.recent_pairings, 0);
    assert!(!outside.new_opponent);

    let id = report_match(&mut club, p[0], report(p[1], p[0], "6-4 6-4"), later).unwrap();
    let b = &club.get_match(id).unwrap().breakdown;
    assert!(!b.repetition_malus.applied);
    assert!(!b.new_opponent_bonus.applied);
}
