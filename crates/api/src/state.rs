//! Application state

use std::sync::Arc;

use common::Config;
use processor::{Calendar, Ingestor, Store};

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub calendar: Calendar,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, ingestor: Arc<Ingestor>) -> Self {
        let calendar = Calendar::new(config.calendar.clone());
        Self {
            config,
            store,
            calendar,
            ingestor,
        }
    }
}
