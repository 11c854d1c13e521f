//! Club tennis ladder: rating engine, match confirmation lifecycle and league formation.

pub mod clock;
pub mod config;
pub mod logic;
pub mod models;
pub mod notify;
pub mod rate_limit;

pub use clock::{Clock, ManualClock, SystemClock};
pub use logic::{
    auto_resolve_match, confirm_match, contest_match, create_league, decide_match,
    effective_group_count, form_league, open_registration, register, reject_match, report_match,
    round_robin_pairs, run_sweep, serpentine_groups, sweep_status, withdraw, Decision,
    FormationOutcome, LifecyclePolicy, MatchReport, NewLeague, RatingBreakdown, RatingInput,
    RatingParams, SweepStatus, SweepSummary,
};
pub use models::{
    AppliedRatings, ClubId, ClubState, Contest, ErrorKind, Fixture, FixtureId, FixtureStatus,
    LadderError, League,
    LeagueId, LeagueStatus, Match, MatchFormat, MatchId, MatchStatus, Participant, ParticipantId,
    Registration, Surface, DEFAULT_RATING,
};
pub use notify::{LogNotifier, Notification, NotificationEvent, Notifier};
