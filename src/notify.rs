//! Outbound notifications.
//!
//! Operations only queue [`Notification`]s on the club state. Once the
//! operation has committed and the lock is released, the queue is drained into
//! a channel and a background task hands each one to a [`Notifier`]. Delivery
//! failures are logged and never reach the state.

use crate::models::{LeagueId, MatchId, ParticipantId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    MatchReported {
        match_id: MatchId,
        reported_by: ParticipantId,
        winner: ParticipantId,
        score: String,
        deadline: DateTime<Utc>,
    },
    MatchConfirmed {
        match_id: MatchId,
        rating_before: i32,
        rating_after: i32,
    },
    MatchAutoResolved {
        match_id: MatchId,
        rating_before: i32,
        rating_after: i32,
    },
    MatchRejected {
        match_id: MatchId,
        rejected_by: ParticipantId,
    },
    MatchContested {
        match_id: MatchId,
        contested_by: ParticipantId,
        reason: String,
    },
    /// Sent to every registrant once groups are drawn.
    LeagueStarted {
        league_id: LeagueId,
        league_name: String,
        group: u32,
        group_count: u32,
        group_size: usize,
        fixture_count: usize,
    },
    LeagueCancelled {
        league_id: LeagueId,
        league_name: String,
        registrants: usize,
    },
}

impl NotificationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::MatchReported { .. } => "match_reported",
            NotificationEvent::MatchConfirmed { .. } => "match_confirmed",
            NotificationEvent::MatchAutoResolved { .. } => "match_auto_resolved",
            NotificationEvent::MatchRejected { .. } => "match_rejected",
            NotificationEvent::MatchContested { .. } => "match_contested",
            NotificationEvent::LeagueStarted { .. } => "league_started",
            NotificationEvent::LeagueCancelled { .. } => "league_cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub recipient: ParticipantId,
    pub event: NotificationEvent,
}

impl Notification {
    pub fn new(recipient: ParticipantId, event: NotificationEvent) -> Self {
        Self { recipient, event }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    /// For notifiers outside this crate whose transport failed.
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Payload encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Delivery channel (push, messaging, in-app inbox ...). Lives outside the core.
pub trait Notifier: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes every notification to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&notification.event)?;
        log::info!(
            "notify {} <- {}: {}",
            notification.recipient,
            notification.event.name(),
            payload
        );
        Ok(())
    }
}

/// Deliver queued notifications until every sender is dropped.
pub async fn run_dispatcher(mut rx: UnboundedReceiver<Notification>, notifier: Box<dyn Notifier>) {
    while let Some(notification) = rx.recv().await {
        if let Err(e) = notifier.deliver(&notification) {
            log::warn!(
                "Could not deliver {} to {}: {}",
                notification.event.name(),
                notification.recipient,
                e
            );
        }
    }
    log::info!("Notification dispatcher stopped");
}
