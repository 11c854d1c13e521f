//! Ladder business logic: ratings, match lifecycle, league setup and formation, sweep.

mod league_admin;
mod league_formation;
mod lifecycle;
pub mod rating;
mod score;
mod sweep;

pub use league_admin::{create_league, open_registration, register, withdraw, NewLeague};
pub use league_formation::{
    effective_group_count, form_league, round_robin_pairs, serpentine_groups, FormationOutcome,
    GroupSummary, SINGLE_GROUP_MAX,
};
pub use lifecycle::{
    auto_resolve_match, confirm_match, contest_match, decide_match, history_inputs,
    reject_match, report_match, Decision, HistoryInputs, LifecyclePolicy, MatchReport,
};
pub use rating::{RatingBreakdown, RatingInput, RatingParams};
pub use score::{infer_format, parse_score, ParsedScore};
pub use sweep::{
    leagues_due, overdue_matches, run_sweep, sweep_status, LeagueSweepOutcome, LeagueSweepResult,
    MatchSweepOutcome, MatchSweepResult, PendingLeague, SweepStatus, SweepSummary,
};
