//! Group draw: partition registrants and generate round-robin fixtures.

use crate::models::{
    ClubState, Fixture, LadderError, LeagueId, LeagueStatus, ParticipantId,
};
use crate::notify::{Notification, NotificationEvent};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

/// Up to this many registrants always play in a single group.
pub const SINGLE_GROUP_MAX: usize = 6;

/// Size and rating spread of one drawn group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group: u32,
    pub members: usize,
    /// Mean of the registration rating snapshots.
    pub average_rating: i32,
    pub fixtures: usize,
}

/// Result of processing one league whose registration closed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FormationOutcome {
    Started {
        group_count: u32,
        groups: Vec<GroupSummary>,
        fixtures: usize,
    },
    Cancelled {
        registrants: usize,
    },
}

/// Number of groups actually used for `registrants` players.
///
/// One group up to [`SINGLE_GROUP_MAX`]; otherwise the smallest of the count
/// implied by the target size, the requested count and `registrants / 2`, so
/// every group has at least two members.
pub fn effective_group_count(registrants: usize, requested: u32, target_size: u32) -> usize {
    if registrants <= SINGLE_GROUP_MAX {
        return 1;
    }
    let by_size = registrants.div_ceil(target_size.max(2) as usize);
    by_size
        .min(requested.max(1) as usize)
        .min(registrants / 2)
        .max(1)
}

/// 0-based group for each position of an already shuffled list.
///
/// Direction reverses on every pass: with 3 groups positions go
/// 0 1 2 2 1 0 0 1 2 ...
pub fn serpentine_groups(count: usize, groups: usize) -> Vec<usize> {
    (0..count)
        .map(|i| {
            let pass = i / groups;
            let pos = i % groups;
            if pass % 2 == 0 {
                pos
            } else {
                groups - 1 - pos
            }
        })
        .collect()
}

/// Every unordered pair of `members` exactly once.
pub fn round_robin_pairs<T: Copy>(members: &[T]) -> Vec<(T, T)> {
    let mut pairs = Vec::with_capacity(members.len() * members.len().saturating_sub(1) / 2);
    for (i, &a) in members.iter().enumerate() {
        for &b in &members[i + 1..] {
            pairs.push((a, b));
        }
    }
    pairs
}

/// Draw groups for a league whose registration deadline has passed.
///
/// 1. Fewer than two active registrants: the league is cancelled.
/// 2. Otherwise shuffle, assign groups in serpentine order, and generate a
///    round robin per group with the league end date as deadline.
/// 3. Assignments, fixtures and the move to `Active` are committed together.
///
/// A league that is no longer in `Registration` is rejected, so running this
/// twice for the same league never draws twice.
pub fn form_league<R: Rng + ?Sized>(
    club: &mut ClubState,
    league_id: LeagueId,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<FormationOutcome, LadderError> {
    let league = club.league(league_id)?;
    if league.status != LeagueStatus::Registration {
        if league.groups_drawn() {
            return Err(LadderError::GroupsAlreadyDrawn(league_id));
        }
        return Err(LadderError::InvalidLeagueTransition {
            from: league.status,
            to: LeagueStatus::Active,
        });
    }
    if league.registration_deadline > now {
        return Err(LadderError::RegistrationStillOpen);
    }
    let name = league.name.clone();
    let end_date = league.end_date;
    let requested = league.requested_group_count;
    let target_size = league.target_group_size;

    let mut registrants: Vec<(ParticipantId, i32)> = club
        .active_registrations(league_id)
        .map(|r| (r.participant_id, r.rating_snapshot))
        .collect();

    if registrants.len() < 2 {
        club.league_mut(league_id)?.transition(LeagueStatus::Cancelled)?;
        for &(participant, _) in &registrants {
            club.notify(Notification::new(
                participant,
                NotificationEvent::LeagueCancelled {
                    league_id,
                    league_name: name.clone(),
                    registrants: registrants.len(),
                },
            ));
        }
        log::info!(
            "League {league_id} cancelled: {} active registrant(s)",
            registrants.len()
        );
        return Ok(FormationOutcome::Cancelled {
            registrants: registrants.len(),
        });
    }

    let group_count = effective_group_count(registrants.len(), requested, target_size);
    registrants.shuffle(rng);
    let mut groups: Vec<Vec<(ParticipantId, i32)>> = vec![Vec::new(); group_count];
    for (entry, group) in registrants
        .iter()
        .zip(serpentine_groups(registrants.len(), group_count))
    {
        groups[group].push(*entry);
    }

    let mut fixtures = Vec::new();
    let mut summaries = Vec::with_capacity(group_count);
    let mut assignment: HashMap<ParticipantId, u32> = HashMap::new();
    for (idx, members) in groups.iter().enumerate() {
        let group = idx as u32 + 1;
        let ids: Vec<ParticipantId> = members.iter().map(|(id, _)| *id).collect();
        let pairs = round_robin_pairs(&ids);
        summaries.push(GroupSummary {
            group,
            members: ids.len(),
            average_rating: members.iter().map(|(_, r)| i64::from(*r)).sum::<i64>() as i32
                / ids.len() as i32,
            fixtures: pairs.len(),
        });
        fixtures.extend(
            pairs
                .into_iter()
                .map(|(home, away)| Fixture::new(league_id, group, home, away, end_date)),
        );
        assignment.extend(ids.iter().map(|id| (*id, group)));
    }

    let fixture_count = fixtures.len();
    let league = club.league_mut(league_id)?;
    league.transition(LeagueStatus::Active)?;
    league.group_count = group_count as u32;
    league.drawn_at = Some(now);
    for registration in club
        .registrations
        .iter_mut()
        .filter(|r| r.league_id == league_id && r.active)
    {
        registration.group = assignment.get(&registration.participant_id).copied();
    }
    club.fixtures.extend(fixtures);

    for summary in &summaries {
        for (participant, _) in &groups[summary.group as usize - 1] {
            club.notify(Notification::new(
                *participant,
                NotificationEvent::LeagueStarted {
                    league_id,
                    league_name: name.clone(),
                    group: summary.group,
                    group_count: group_count as u32,
                    group_size: summary.members,
                    fixture_count: summary.members - 1,
                },
            ));
        }
    }
    log::info!(
        "League {league_id} started: {} registrants in {group_count} group(s), {fixture_count} fixtures",
        registrants.len()
    );

    Ok(FormationOutcome::Started {
        group_count: group_count as u32,
        groups: summaries,
        fixtures: fixture_count,
    })
}
