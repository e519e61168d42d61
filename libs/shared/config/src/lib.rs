use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
/// Clinic local time is UTC+7.
pub const DEFAULT_DISPLAY_UTC_OFFSET_SECONDS: i32 = 7 * 3600;
pub const DEFAULT_CONFLICT_WINDOW_SECONDS: i64 = 1800;
pub const DEFAULT_REMINDER_HOURS: i64 = 24;
pub const DEFAULT_MAX_REMINDER_HOURS: i64 = 168;

const MAX_UTC_OFFSET_SECONDS: i32 = 14 * 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_address: String,
    pub display_utc_offset_seconds: i32,
    pub conflict_window_seconds: i64,
    pub default_reminder_hours: i64,
    pub max_reminder_hours: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            display_utc_offset_seconds: DEFAULT_DISPLAY_UTC_OFFSET_SECONDS,
            conflict_window_seconds: DEFAULT_CONFLICT_WINDOW_SECONDS,
            default_reminder_hours: DEFAULT_REMINDER_HOURS,
            max_reminder_hours: DEFAULT_MAX_REMINDER_HOURS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| {
                    warn!("BIND_ADDRESS not set, using default");
                    DEFAULT_BIND_ADDRESS.to_string()
                }),
            display_utc_offset_seconds: parse_var(
                "DISPLAY_UTC_OFFSET_SECONDS",
                DEFAULT_DISPLAY_UTC_OFFSET_SECONDS,
            ),
            conflict_window_seconds: parse_var(
                "CONFLICT_WINDOW_SECONDS",
                DEFAULT_CONFLICT_WINDOW_SECONDS,
            ),
            default_reminder_hours: parse_var("DEFAULT_REMINDER_HOURS", DEFAULT_REMINDER_HOURS),
            max_reminder_hours: parse_var("MAX_REMINDER_HOURS", DEFAULT_MAX_REMINDER_HOURS),
        };

        if !config.is_configured() {
            warn!("Scheduler configuration is inconsistent - check environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.bind_address.is_empty()
            && self.conflict_window_seconds > 0
            && self.display_utc_offset_seconds.abs() <= MAX_UTC_OFFSET_SECONDS
            && self.default_reminder_hours > 0
            && self.default_reminder_hours <= self.max_reminder_hours
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", name, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", name, default);
            default
        }
    }
}
