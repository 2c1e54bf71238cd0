//! Helpers for building seeded apps.

use std::path::Path;
use std::sync::Arc;

use loresmith_domain::{CampaignId, GameState};

use crate::app::App;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::file_store::JsonFileStateStore;
use crate::infrastructure::ports::StateStore;
use crate::infrastructure::settings::EngineSettings;

/// In-memory app with one campaign seeded with `state`.
pub async fn seeded_app(state: &GameState) -> (App, CampaignId) {
    let app = App::in_memory(EngineSettings::default());
    let campaign = CampaignId::new();
    app.store
        .save(campaign, state)
        .await
        .expect("seeding in-memory store");
    (app, campaign)
}

/// App backed by JSON files under `dir`.
pub fn file_backed_app(dir: &Path) -> App {
    let settings = EngineSettings {
        state_dir: dir.to_path_buf(),
        ..EngineSettings::default()
    };
    let store: Arc<dyn StateStore> = Arc::new(JsonFileStateStore::new(dir));
    App::new(settings, store, Arc::new(SystemClock::new()))
}

/// Current stored document for `campaign`, empty if none.
pub async fn stored_state(app: &App, campaign: CampaignId) -> GameState {
    app.store
        .load(campaign)
        .await
        .expect("loading stored state")
        .unwrap_or_default()
}
