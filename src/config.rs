//! Runtime configuration, read from the environment.

use crate::logic::LifecyclePolicy;
use chrono::Duration;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Required as `Authorization: Bearer <secret>` on the sweep trigger when set.
    pub cron_secret: Option<String>,
    /// Hours the opponent has to confirm a reported match.
    pub confirmation_window_hours: i64,
    /// Decisions and contests per caller per minute.
    pub rate_limit_per_minute: usize,
    pub contest_monthly_cap: u32,
    pub contest_min_reason_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = LifecyclePolicy::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cron_secret: None,
            confirmation_window_hours: policy.confirmation_window.num_hours(),
            rate_limit_per_minute: 30,
            contest_monthly_cap: policy.contest_monthly_cap,
            contest_min_reason_len: policy.contest_min_reason_len,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cron_secret = env::var("CRON_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Settings {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            cron_secret,
            confirmation_window_hours: parse_var("CONFIRMATION_WINDOW_HOURS")
                .filter(|h: &i64| *h > 0)
                .unwrap_or(defaults.confirmation_window_hours),
            rate_limit_per_minute: parse_var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or(defaults.rate_limit_per_minute),
            contest_monthly_cap: parse_var("CONTEST_MONTHLY_CAP")
                .unwrap_or(defaults.contest_monthly_cap),
            contest_min_reason_len: parse_var("CONTEST_MIN_REASON_LEN")
                .unwrap_or(defaults.contest_min_reason_len),
        }
    }

    pub fn lifecycle_policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            confirmation_window: Duration::hours(self.confirmation_window_hours),
            contest_monthly_cap: self.contest_monthly_cap,
            contest_min_reason_len: self.contest_min_reason_len,
            ..LifecyclePolicy::default()
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
