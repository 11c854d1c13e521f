//! Integration tests for the rating calculation.

use club_ladder::logic::rating::{calculate, k_factor, loser_delta, margin_modifier};
use club_ladder::{MatchFormat, RatingInput, RatingParams};
use proptest::prelude::*;

fn even_input() -> RatingInput {
    RatingInput {
        winner_rating: 1000,
        loser_rating: 1000,
        winner_matches: 0,
        loser_matches: 0,
        format: MatchFormat::Standard,
        // 6-4 4-6 7-5: a two-game margin leaves the margin modifier neutral
        winner_games: 17,
        loser_games: 15,
        new_opponent: false,
        recent_pairings: 0,
        weekly_opponents: 1,
    }
}

#[test]
fn even_ratings_without_modifiers() {
    let params = RatingParams::default();
    let b = calculate(&even_input(), &params);
    assert!((b.win_probability - 0.5).abs() < 1e-9);
    assert_eq!(b.k_factor, params.k_new);
    assert_eq!(b.multiplier, 1.0);
    assert_eq!(b.winner_delta, 20);
    assert_eq!(b.loser_delta, -16);
    assert_eq!(b.winner_rating_after, 1020);
    assert_eq!(b.loser_rating_after, 984);
}

#[test]
fn k_factor_steps_down_with_experience() {
    let params = RatingParams::default();
    assert_eq!(k_factor(0, 0, &params), 40.0);
    assert_eq!(k_factor(15, 5, &params), 32.0);
    assert_eq!(k_factor(40, 30, &params), 24.0);
    assert_eq!(k_factor(u32::MAX, u32::MAX, &params), 24.0);
}

#[test]
fn favourite_gains_less_than_underdog() {
    let params = RatingParams::default();
    let favourite = calculate(
        &RatingInput {
            winner_rating: 1300,
            ..even_input()
        },
        &params,
    );
    let underdog = calculate(
        &RatingInput {
            winner_rating: 1000,
            loser_rating: 1300,
            ..even_input()
        },
        &params,
    );
    assert!(favourite.winner_delta < 20);
    assert!(underdog.winner_delta > 20);
    assert!(underdog.upset_bonus.applied);
    assert!(!favourite.upset_bonus.applied);
}

#[test]
fn upset_needs_a_gap_above_threshold() {
    let params = RatingParams::default();
    let at_threshold = calculate(
        &RatingInput {
            loser_rating: 1100,
            ..even_input()
        },
        &params,
    );
    assert!(!at_threshold.upset_bonus.applied);
    assert_eq!(at_threshold.upset_bonus.value, 1.0);
}

#[test]
fn margin_bands() {
    let params = RatingParams::default();
    assert_eq!(margin_modifier(12, 0, &params).value, 1.2);
    assert_eq!(margin_modifier(12, 6, &params).value, 1.1);
    assert_eq!(margin_modifier(12, 9, &params).value, 1.0);
    assert_eq!(margin_modifier(13, 12, &params).value, 0.9);
}

#[test]
fn missing_score_is_neutral_and_flagged() {
    let params = RatingParams::default();
    let b = calculate(
        &RatingInput {
            winner_games: 0,
            loser_games: 0,
            ..even_input()
        },
        &params,
    );
    assert!(b.margin.degraded);
    assert_eq!(b.margin.value, 1.0);
    assert_eq!(b.winner_delta, 20);
}

#[test]
fn short_format_scales_down() {
    let params = RatingParams::default();
    let b = calculate(
        &RatingInput {
            format: MatchFormat::Short,
            ..even_input()
        },
        &params,
    );
    assert_eq!(b.format_coefficient, 0.6);
    assert_eq!(b.winner_delta, 12);
}

#[test]
fn new_opponent_and_diversity_bonuses() {
    let params = RatingParams::default();
    let b = calculate(
        &RatingInput {
            new_opponent: true,
            weekly_opponents: 3,
            ..even_input()
        },
        &params,
    );
    assert!(b.new_opponent_bonus.applied);
    assert!(b.diversity_bonus.applied);
    assert!((b.multiplier - 1.1 * 1.05).abs() < 1e-9);
    assert_eq!(b.winner_delta, 23);
}

#[test]
fn repetition_malus_has_a_floor() {
    let params = RatingParams::default();
    let once = calculate(
        &RatingInput {
            recent_pairings: 1,
            ..even_input()
        },
        &params,
    );
    assert_eq!(once.repetition_malus.value, 0.75);
    let many = calculate(
        &RatingInput {
            recent_pairings: 10,
            ..even_input()
        },
        &params,
    );
    assert_eq!(many.repetition_malus.value, params.repetition_floor);
    assert_eq!(many.winner_delta, 5);
}

#[test]
fn loser_never_drops_below_floor() {
    let params = RatingParams::default();
    let b = calculate(
        &RatingInput {
            loser_rating: 105,
            winner_rating: 100,
            ..even_input()
        },
        &params,
    );
    assert_eq!(b.loser_rating_after, params.rating_floor);
}

proptest! {
    #[test]
    fn loser_delta_is_share_of_winner_gain(
        winner_rating in 100i32..3000,
        loser_rating in 100i32..3000,
        winner_matches in 0u32..200,
        loser_matches in 0u32..200,
        winner_games in 0u32..40,
        loser_games in 0u32..40,
        new_opponent in any::<bool>(),
        recent_pairings in 0u32..6,
        weekly_opponents in 1u32..8,
    ) {
        let params = RatingParams::default();
        let b = calculate(&RatingInput {
            winner_rating,
            loser_rating,
            winner_matches,
            loser_matches,
            format: MatchFormat::Standard,
            winner_games,
            loser_games,
            new_opponent,
            recent_pairings,
            weekly_opponents,
        }, &params);
        prop_assert!(b.winner_delta >= 0);
        prop_assert!(b.loser_delta <= 0);
        prop_assert_eq!(b.loser_delta, loser_delta(b.winner_delta, &params));
        prop_assert!(b.loser_rating_after >= params.rating_floor);
        prop_assert_eq!(b.winner_rating_after, winner_rating + b.winner_delta);
    }
}
