use std::sync::Arc;

use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Requester, RequesterRole};

use crate::extractor::{REQUESTER_ID_HEADER, REQUESTER_ROLE_HEADER};
use crate::time::now_timestamp;

/// 2026-01-01T00:00:00Z, a fixed reference instant for deterministic tests.
pub const TEST_EPOCH: i64 = 1_767_225_600;

pub struct TestConfig {
    pub conflict_window_seconds: i64,
    pub display_utc_offset_seconds: i32,
    pub default_reminder_hours: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            conflict_window_seconds: 1800,
            display_utc_offset_seconds: 7 * 3600,
            default_reminder_hours: 24,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            bind_address: "127.0.0.1:0".to_string(),
            display_utc_offset_seconds: self.display_utc_offset_seconds,
            conflict_window_seconds: self.conflict_window_seconds,
            default_reminder_hours: self.default_reminder_hours,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub role: RequesterRole,
}

impl TestUser {
    pub fn new(role: RequesterRole) -> Self {
        let prefix = match role {
            RequesterRole::Doctor => "D",
            RequesterRole::Patient => "P",
        };
        Self { id: unique_id(prefix), role }
    }

    pub fn doctor() -> Self {
        Self::new(RequesterRole::Doctor)
    }

    pub fn patient() -> Self {
        Self::new(RequesterRole::Patient)
    }

    pub fn to_requester(&self) -> Requester {
        Requester { id: self.id.clone(), role: self.role }
    }

    /// Header pairs understood by [`crate::extractor::RequesterIdentity`].
    pub fn headers(&self) -> [(&'static str, String); 2] {
        [
            (REQUESTER_ID_HEADER, self.id.clone()),
            (REQUESTER_ROLE_HEADER, self.role.to_string()),
        ]
    }
}

/// Alphanumeric id that will not collide across tests.
pub fn unique_id(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

pub fn hours_from_now(hours: i64) -> i64 {
    now_timestamp() + hours * 3600
}
