//! League setup: create, open registration, register and withdraw.

use crate::models::{
    ClubId, ClubState, LadderError, League, LeagueId, LeagueStatus, ParticipantId, Registration,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Organiser input for a new league.
#[derive(Clone, Debug, Deserialize)]
pub struct NewLeague {
    pub club_id: ClubId,
    pub name: String,
    pub capacity: u32,
    pub requested_group_count: u32,
    pub target_group_size: u32,
    pub registration_deadline: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// Create a league in `Draft`.
pub fn create_league(
    club: &mut ClubState,
    new: NewLeague,
    now: DateTime<Utc>,
) -> Result<LeagueId, LadderError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(LadderError::MissingField { field: "name" });
    }
    if new.capacity < 2 {
        return Err(LadderError::InvalidLeague("capacity must be at least 2"));
    }
    if new.requested_group_count < 1 {
        return Err(LadderError::InvalidLeague("group count must be at least 1"));
    }
    if new.target_group_size < 2 {
        return Err(LadderError::InvalidLeague("group size must be at least 2"));
    }
    if new.end_date <= new.registration_deadline {
        return Err(LadderError::InvalidLeague(
            "end date must be after the registration deadline",
        ));
    }

    let league = League {
        id: Uuid::new_v4(),
        club_id: new.club_id,
        name: name.to_string(),
        capacity: new.capacity,
        requested_group_count: new.requested_group_count,
        target_group_size: new.target_group_size,
        group_count: new.requested_group_count,
        registration_deadline: new.registration_deadline,
        end_date: new.end_date,
        status: LeagueStatus::Draft,
        drawn_at: None,
        created_at: now,
    };
    let id = league.id;
    club.leagues.insert(id, league);
    log::info!("League {id} ({name}) created");
    Ok(id)
}

/// Draft -> Registration.
pub fn open_registration(club: &mut ClubState, league_id: LeagueId) -> Result<(), LadderError> {
    club.league_mut(league_id)?
        .transition(LeagueStatus::Registration)
}

/// Register a club member, or re-activate a previous withdrawal.
pub fn register(
    club: &mut ClubState,
    league_id: LeagueId,
    participant_id: ParticipantId,
    now: DateTime<Utc>,
) -> Result<(), LadderError> {
    let league = club.league(league_id)?;
    if league.status != LeagueStatus::Registration || now > league.registration_deadline {
        return Err(LadderError::RegistrationClosed);
    }
    let participant = club.participant(participant_id)?;
    if participant.club_id != league.club_id {
        return Err(LadderError::DifferentClub);
    }
    let rating = participant.rating;
    let capacity = league.capacity as usize;

    let existing = club
        .registrations
        .iter()
        .position(|r| r.league_id == league_id && r.participant_id == participant_id);
    if let Some(idx) = existing {
        if club.registrations[idx].active {
            return Err(LadderError::AlreadyRegistered);
        }
    }
    if club.active_registrations(league_id).count() >= capacity {
        return Err(LadderError::LeagueFull);
    }

    match existing {
        Some(idx) => {
            let registration = &mut club.registrations[idx];
            registration.active = true;
            registration.rating_snapshot = rating;
            registration.registered_at = now;
        }
        None => club.registrations.push(Registration {
            league_id,
            participant_id,
            rating_snapshot: rating,
            group: None,
            active: true,
            registered_at: now,
        }),
    }
    Ok(())
}

/// Withdraw before the draw. The registration is kept, marked inactive.
/// Participants can only withdraw themselves.
pub fn withdraw(
    club: &mut ClubState,
    league_id: LeagueId,
    participant_id: ParticipantId,
    caller: ParticipantId,
) -> Result<(), LadderError> {
    if caller != participant_id {
        return Err(LadderError::NotSelf);
    }
    let league = club.league(league_id)?;
    if league.groups_drawn() {
        return Err(LadderError::GroupsAlreadyDrawn(league_id));
    }
    if league.status != LeagueStatus::Registration {
        return Err(LadderError::RegistrationClosed);
    }
    let registration = club
        .registrations
        .iter_mut()
        .find(|r| r.league_id == league_id && r.participant_id == participant_id && r.active)
        .ok_or(LadderError::NotRegistered)?;
    registration.active = false;
    Ok(())
}
