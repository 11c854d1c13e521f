//! Single binary web server: match reporting and decisions, league setup, sweep trigger.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! The caller is identified by the `X-Participant-Id` header; authentication
//! happens in front of this service.

use actix_web::{
    delete, get, post,
    web::{self, Data, Json, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use club_ladder::config::Settings;
use club_ladder::notify::run_dispatcher;
use club_ladder::rate_limit::RateLimiter;
use club_ladder::{
    create_league, decide_match, open_registration, register, report_match, run_sweep,
    sweep_status, withdraw, Clock, ClubId, ClubState, Decision, ErrorKind, LadderError, LeagueId,
    LogNotifier, MatchId, MatchReport, NewLeague, Notification, ParticipantId, SystemClock,
};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

/// Shared state: the club behind one lock, plus the services around it.
struct AppContext {
    club: RwLock<ClubState>,
    clock: Box<dyn Clock>,
    limiter: RateLimiter,
    settings: Settings,
    outbound: UnboundedSender<Notification>,
}

type AppState = Data<AppContext>;

const CALLER_HEADER: &str = "X-Participant-Id";

/// How often idle rate-limit entries are dropped.
const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct AddParticipantBody {
    club_id: ClubId,
    name: String,
}

#[derive(Deserialize)]
struct LeaguePath {
    id: LeagueId,
}

#[derive(Deserialize)]
struct LeagueParticipantPath {
    id: LeagueId,
    participant_id: ParticipantId,
}

#[derive(Deserialize)]
struct IdPath {
    id: Uuid,
}

fn error_response(e: &LadderError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::Validation => HttpResponse::BadRequest().json(body),
        ErrorKind::Forbidden => HttpResponse::Forbidden().json(body),
        ErrorKind::NotFound => HttpResponse::NotFound().json(body),
        ErrorKind::Conflict => HttpResponse::Conflict().json(body),
        ErrorKind::RateLimited => HttpResponse::TooManyRequests().json(body),
        ErrorKind::Internal => HttpResponse::InternalServerError().json(body),
    }
}

fn lock_error() -> HttpResponse {
    log::error!("Club state lock poisoned");
    HttpResponse::InternalServerError().body("lock error")
}

fn caller_id(req: &HttpRequest) -> Result<ParticipantId, HttpResponse> {
    req.headers()
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| {
            HttpResponse::Unauthorized()
                .json(serde_json::json!({ "error": "Missing or invalid X-Participant-Id header" }))
        })
}

/// Shared-secret check for the sweep trigger. Open when no secret is configured.
fn cron_authorized(req: &HttpRequest, settings: &Settings) -> bool {
    match &settings.cron_secret {
        None => true,
        Some(secret) => req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token.trim() == secret.as_str()),
    }
}

/// Hand notifications to the dispatcher. Called after the state lock is released.
fn flush_outbox(state: &AppContext, notifications: Vec<Notification>) {
    for notification in notifications {
        if state.outbound.send(notification).is_err() {
            log::warn!("Notification dispatcher stopped; dropping notifications");
            return;
        }
    }
}

fn league_view(club: &ClubState, id: LeagueId) -> Result<serde_json::Value, LadderError> {
    let league = club.league(id)?;
    let registrations: Vec<_> = club.league_registrations(id).collect();
    let fixtures: Vec<_> = club.league_fixtures(id).collect();
    Ok(serde_json::json!({
        "league": league,
        "registrations": registrations,
        "fixtures": fixtures,
    }))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "club-ladder",
    })
}

/// Add a club member (administration).
#[post("/api/participants")]
async fn api_add_participant(state: AppState, body: Json<AddParticipantBody>) -> HttpResponse {
    let mut club = match state.club.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let body = body.into_inner();
    match club.add_participant(body.club_id, body.name) {
        Ok(id) => match club.participant(id) {
            Ok(p) => HttpResponse::Created().json(p),
            Err(e) => error_response(&e),
        },
        Err(e) => error_response(&e),
    }
}

#[get("/api/participants/{id}")]
async fn api_get_participant(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let club = match state.club.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match club.participant(path.id) {
        Ok(p) => HttpResponse::Ok().json(p),
        Err(e) => error_response(&e),
    }
}

/// Create a league in draft (administration).
#[post("/api/leagues")]
async fn api_create_league(state: AppState, body: Json<NewLeague>) -> HttpResponse {
    let now = state.clock.now();
    let mut club = match state.club.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match create_league(&mut club, body.into_inner(), now).and_then(|id| league_view(&club, id)) {
        Ok(view) => HttpResponse::Created().json(view),
        Err(e) => error_response(&e),
    }
}

#[get("/api/leagues/{id}")]
async fn api_get_league(state: AppState, path: Path<LeaguePath>) -> HttpResponse {
    let club = match state.club.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match league_view(&club, path.id) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Open registration (draft -> registration).
#[post("/api/leagues/{id}/open")]
async fn api_open_league(state: AppState, path: Path<LeaguePath>) -> HttpResponse {
    let mut club = match state.club.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match open_registration(&mut club, path.id).and_then(|()| league_view(&club, path.id)) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Register the caller for a league.
#[post("/api/leagues/{id}/registrations")]
async fn api_register(state: AppState, req: HttpRequest, path: Path<LeaguePath>) -> HttpResponse {
    let caller = match caller_id(&req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let now = state.clock.now();
    let mut club = match state.club.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match register(&mut club, path.id, caller, now).and_then(|()| league_view(&club, path.id)) {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Withdraw the caller's own registration before the draw.
#[delete("/api/leagues/{id}/registrations/{participant_id}")]
async fn api_withdraw(
    state: AppState,
    req: HttpRequest,
    path: Path<LeagueParticipantPath>,
) -> HttpResponse {
    let caller = match caller_id(&req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let mut club = match state.club.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match withdraw(&mut club, path.id, path.participant_id, caller)
        .and_then(|()| league_view(&club, path.id))
    {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// Report a result. Returns the pending match and its projected rating breakdown.
#[post("/api/matches")]
async fn api_report_match(state: AppState, req: HttpRequest, body: Json<MatchReport>) -> HttpResponse {
    let caller = match caller_id(&req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let now = state.clock.now();
    let (response, outbox) = {
        let mut club = match state.club.write() {
            Ok(guard) => guard,
            Err(_) => return lock_error(),
        };
        let response = match report_match(&mut club, caller, body.into_inner(), now)
            .and_then(|id| club.get_match(id))
        {
            Ok(m) => HttpResponse::Created().json(serde_json::json!({
                "match": m,
                "breakdown": m.breakdown,
            })),
            Err(e) => error_response(&e),
        };
        (response, club.take_outbox())
    };
    flush_outbox(&state, outbox);
    response
}

#[get("/api/matches/{id}")]
async fn api_get_match(state: AppState, path: Path<IdPath>) -> HttpResponse {
    let club = match state.club.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match club.get_match(path.id) {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => error_response(&e),
    }
}

/// Confirm, reject or contest a match. Rate limited per caller before any state is read.
#[post("/api/matches/{id}/decision")]
async fn api_decide_match(
    state: AppState,
    req: HttpRequest,
    path: Path<IdPath>,
    body: Json<Decision>,
) -> HttpResponse {
    let caller = match caller_id(&req) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let now = state.clock.now();
    if let Err(e) = state.limiter.check(caller, now) {
        return error_response(&e);
    }
    let match_id: MatchId = path.id;
    let (response, outbox) = {
        let mut club = match state.club.write() {
            Ok(guard) => guard,
            Err(_) => return lock_error(),
        };
        let response = match decide_match(&mut club, match_id, caller, &body, now)
            .and_then(|()| club.get_match(match_id))
        {
            Ok(m) => HttpResponse::Ok().json(m),
            Err(e) => error_response(&e),
        };
        (response, club.take_outbox())
    };
    flush_outbox(&state, outbox);
    response
}

/// Sweep trigger: auto-resolve overdue matches and draw leagues whose registration closed.
#[post("/api/cron/sweep")]
async fn api_sweep(state: AppState, req: HttpRequest) -> HttpResponse {
    if !cron_authorized(&req, &state.settings) {
        return HttpResponse::Unauthorized().json(serde_json::json!({ "error": "Invalid cron secret" }));
    }
    let ctx = state.clone();
    let result = web::block(move || {
        let mut rng = rand::thread_rng();
        run_sweep(&ctx.club, ctx.clock.as_ref(), &mut rng)
    })
    .await;
    let summary = match result {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => return error_response(&e),
        Err(e) => {
            log::error!("Sweep task failed: {e}");
            return HttpResponse::InternalServerError().json(serde_json::json!({ "error": "Sweep failed" }));
        }
    };
    let outbox = match state.club.write() {
        Ok(mut club) => club.take_outbox(),
        Err(_) => return lock_error(),
    };
    flush_outbox(&state, outbox);
    HttpResponse::Ok().json(summary)
}

/// Read-only view of leagues awaiting their draw and overdue matches.
#[get("/api/cron/status")]
async fn api_sweep_status(state: AppState) -> HttpResponse {
    let now = state.clock.now();
    let club = match state.club.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(sweep_status(&club, now))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env();
    let bind = (settings.host.clone(), settings.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    if settings.cron_secret.is_none() {
        log::warn!("CRON_SECRET not set; the sweep trigger is open");
    }

    let (outbound, inbound) = mpsc::unbounded_channel();
    actix_web::rt::spawn(run_dispatcher(inbound, Box::new(LogNotifier)));

    let state = Data::new(AppContext {
        club: RwLock::new(ClubState::new(settings.lifecycle_policy())),
        clock: Box::new(SystemClock),
        limiter: RateLimiter::per_minute(settings.rate_limit_per_minute),
        settings,
        outbound,
    });

    // Background task: drop rate-limit windows of callers that went quiet
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(LIMITER_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            state_cleanup.limiter.prune(state_cleanup.clock.now());
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_add_participant)
            .service(api_get_participant)
            .service(api_create_league)
            .service(api_get_league)
            .service(api_open_league)
            .service(api_register)
            .service(api_withdraw)
            .service(api_report_match)
            .service(api_get_match)
            .service(api_decide_match)
            .service(api_sweep)
            .service(api_sweep_status)
    })
    .bind(bind)?
    .run()
    .await
}
