use crate::config::Config;
use crate::core::{Authenticator, LevelState};
use crate::session::SessionStore;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub config: Arc<Config>,
    pub authenticator: Arc<Authenticator>,
    pub sessions: SessionStore,
    pub level: LevelState,
}

impl AppState {
    pub fn new(config: Config, authenticator: Authenticator) -> Self {
        Self {
            sessions: SessionStore::new(&config.session),
            level: LevelState::default(),
            authenticator: Arc::new(authenticator),
            config: Arc::new(config),
        }
    }
}
