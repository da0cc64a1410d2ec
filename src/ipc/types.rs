use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::card::CardReader;
use crate::session::Session;
use crate::sync::{SharedTracker, SyncScheduler, Syncer};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub tracker: SharedTracker,
    pub session: Option<Session>,
    pub syncer: Arc<Syncer>,
    pub scheduler: Option<SyncScheduler>,
    pub reader: Box<dyn CardReader>,
}
