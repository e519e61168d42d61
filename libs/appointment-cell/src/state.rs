use std::sync::Arc;

use tokio::sync::RwLock;

use shared_config::AppConfig;

use crate::services::engine::SchedulingEngine;

/// Router state: configuration plus the one engine instance, guarded by a
/// single writer lock.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: RwLock<SchedulingEngine>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let engine = SchedulingEngine::with_conflict_window(config.conflict_window_seconds);
        Self {
            config,
            engine: RwLock::new(engine),
        }
    }

    pub fn shared(config: Arc<AppConfig>) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn utc_offset(&self) -> i32 {
        self.config.display_utc_offset_seconds
    }
}
