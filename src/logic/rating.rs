//! Elo-style rating change with activity modifiers.
//!
//! The winner's change is `K * (1 - p) * modifiers`, where `p` is the
//! winner's expected score. The loser gives up a fixed share of that, and
//! never drops below the rating floor. Everything that went into the number
//! is returned in a [`RatingBreakdown`] so a result can be replayed later.

use crate::models::MatchFormat;
use serde::{Deserialize, Serialize};

/// Tunable constants of the rating model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingParams {
    /// Rating gap at which the favourite is expected to win 10:1.
    pub scale: f64,
    pub k_new: f64,
    pub k_intermediate: f64,
    pub k_established: f64,
    /// Average match count below which `k_new` applies.
    pub new_player_matches: u32,
    /// Average match count below which `k_intermediate` applies.
    pub established_matches: u32,
    pub short_format_coefficient: f64,
    pub long_format_coefficient: f64,
    pub lopsided_margin: i32,
    pub lopsided_bonus: f64,
    pub clear_margin: i32,
    pub clear_bonus: f64,
    pub close_margin: i32,
    pub close_malus: f64,
    pub new_opponent_bonus: f64,
    /// Winner must trail by more than this for the upset bonus.
    pub upset_threshold: i32,
    pub upset_bonus: f64,
    /// Removed from the multiplier per recent match of the same pairing.
    pub repetition_step: f64,
    pub repetition_floor: f64,
    pub diversity_min_opponents: u32,
    pub diversity_bonus: f64,
    /// Fraction of the winner's gain taken from the loser.
    pub loser_share: f64,
    pub rating_floor: i32,
}

impl Default for RatingParams {
    fn default() -> Self {
        Self {
            scale: 400.0,
            k_new: 40.0,
            k_intermediate: 32.0,
            k_established: 24.0,
            new_player_matches: 10,
            established_matches: 30,
            short_format_coefficient: 0.6,
            long_format_coefficient: 1.0,
            lopsided_margin: 8,
            lopsided_bonus: 1.2,
            clear_margin: 5,
            clear_bonus: 1.1,
            close_margin: 1,
            close_malus: 0.9,
            new_opponent_bonus: 1.1,
            upset_threshold: 100,
            upset_bonus: 1.2,
            repetition_step: 0.25,
            repetition_floor: 0.25,
            diversity_min_opponents: 3,
            diversity_bonus: 1.05,
            loser_share: 0.8,
            rating_floor: 100,
        }
    }
}

/// Everything the calculation depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingInput {
    pub winner_rating: i32,
    pub loser_rating: i32,
    pub winner_matches: u32,
    pub loser_matches: u32,
    pub format: MatchFormat,
    /// Zero for both when the score could not be parsed.
    pub winner_games: u32,
    pub loser_games: u32,
    /// No validated match between these two players yet.
    pub new_opponent: bool,
    /// Validated matches of this pairing in the trailing week.
    pub recent_pairings: u32,
    /// Distinct opponents of the winner in the trailing week.
    pub weekly_opponents: u32,
}

/// One optional multiplier and whether it was triggered.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub applied: bool,
    pub value: f64,
}

impl Modifier {
    fn when(applied: bool, value: f64) -> Self {
        Self {
            applied,
            value: if applied { value } else { 1.0 },
        }
    }
}

/// Game-differential multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarginModifier {
    pub game_difference: i32,
    pub value: f64,
    /// Score was missing or unparseable; the modifier was forced neutral.
    pub degraded: bool,
}

/// Audit record of one rating calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingBreakdown {
    pub win_probability: f64,
    pub k_factor: f64,
    pub format_coefficient: f64,
    pub margin: MarginModifier,
    pub new_opponent_bonus: Modifier,
    pub upset_bonus: Modifier,
    pub repetition_malus: Modifier,
    pub diversity_bonus: Modifier,
    /// Product of every multiplier above except `k_factor`.
    pub multiplier: f64,
    pub winner_delta: i32,
    pub loser_delta: i32,
    pub winner_rating_before: i32,
    pub loser_rating_before: i32,
    pub winner_rating_after: i32,
    /// Clamped at the rating floor.
    pub loser_rating_after: i32,
}

/// Expected score of the winner against the loser.
pub fn win_probability(winner_rating: i32, loser_rating: i32, scale: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(loser_rating - winner_rating) / scale))
}

/// Base K: larger while the two players are, on average, inexperienced.
pub fn k_factor(winner_matches: u32, loser_matches: u32, params: &RatingParams) -> f64 {
    let average = winner_matches.saturating_add(loser_matches) / 2;
    if average < params.new_player_matches {
        params.k_new
    } else if average < params.established_matches {
        params.k_intermediate
    } else {
        params.k_established
    }
}

pub fn format_coefficient(format: MatchFormat, params: &RatingParams) -> f64 {
    match format {
        MatchFormat::Short => params.short_format_coefficient,
        MatchFormat::Standard => 1.0,
        MatchFormat::Long => params.long_format_coefficient,
    }
}

pub fn margin_modifier(winner_games: u32, loser_games: u32, params: &RatingParams) -> MarginModifier {
    let game_difference = winner_games as i32 - loser_games as i32;
    if winner_games + loser_games == 0 {
        return MarginModifier {
            game_difference: 0,
            value: 1.0,
            degraded: true,
        };
    }
    let value = if game_difference >= params.lopsided_margin {
        params.lopsided_bonus
    } else if game_difference >= params.clear_margin {
        params.clear_bonus
    } else if game_difference <= params.close_margin {
        params.close_malus
    } else {
        1.0
    };
    MarginModifier {
        game_difference,
        value,
        degraded: false,
    }
}

/// Compute the full breakdown. Pure: the same input always gives the same output.
pub fn calculate(input: &RatingInput, params: &RatingParams) -> RatingBreakdown {
    let win_probability = win_probability(input.winner_rating, input.loser_rating, params.scale);
    let k_factor = k_factor(input.winner_matches, input.loser_matches, params);
    let format_coefficient = format_coefficient(input.format, params);
    let margin = margin_modifier(input.winner_games, input.loser_games, params);
    let new_opponent_bonus = Modifier::when(input.new_opponent, params.new_opponent_bonus);
    let upset_bonus = Modifier::when(
        input.loser_rating - input.winner_rating > params.upset_threshold,
        params.upset_bonus,
    );
    let repetition_malus = Modifier::when(
        input.recent_pairings > 0,
        (1.0 - params.repetition_step * f64::from(input.recent_pairings)).max(params.repetition_floor),
    );
    let diversity_bonus = Modifier::when(
        input.weekly_opponents >= params.diversity_min_opponents,
        params.diversity_bonus,
    );

    let multiplier = format_coefficient
        * margin.value
        * new_opponent_bonus.value
        * upset_bonus.value
        * repetition_malus.value
        * diversity_bonus.value;
    let winner_delta = (k_factor * (1.0 - win_probability) * multiplier).round() as i32;
    let loser_delta = loser_delta(winner_delta, params);

    RatingBreakdown {
        win_probability,
        k_factor,
        format_coefficient,
        margin,
        new_opponent_bonus,
        upset_bonus,
        repetition_malus,
        diversity_bonus,
        multiplier,
        winner_delta,
        loser_delta,
        winner_rating_before: input.winner_rating,
        loser_rating_before: input.loser_rating,
        winner_rating_after: input.winner_rating + winner_delta,
        loser_rating_after: clamp_rating(input.loser_rating + loser_delta, params),
    }
}

/// The loser's change for a given winner's change.
pub fn loser_delta(winner_delta: i32, params: &RatingParams) -> i32 {
    -(f64::from(winner_delta) * params.loser_share).round() as i32
}

pub fn clamp_rating(rating: i32, params: &RatingParams) -> i32 {
    rating.max(params.rating_floor)
}
