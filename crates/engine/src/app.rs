//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::SystemClock,
    file_store::JsonFileStateStore,
    memory_store::InMemoryStateStore,
    ports::{ClockPort, StateStore},
    settings::EngineSettings,
};
use crate::reconciliation::Reconciler;
use crate::use_cases;

/// Main application state.
///
/// Holds the state store, the configured reconciler, and all use cases.
pub struct App {
    pub settings: EngineSettings,
    pub store: Arc<dyn StateStore>,
    pub reconciler: Arc<Reconciler>,
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub state: use_cases::StateUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let mut reconciler = Reconciler::from_settings(&settings);
        if let Some(marker) = store.delete_marker() {
            reconciler = reconciler.with_platform_marker(marker);
        }
        let reconciler = Arc::new(reconciler);

        let state = use_cases::StateUseCases::new(
            Arc::new(use_cases::ApplyDirective::new(
                store.clone(),
                reconciler.clone(),
                clock.clone(),
            )),
            Arc::new(use_cases::ApplyTurnProposal::new(
                store.clone(),
                reconciler.clone(),
                clock,
            )),
        );

        Self {
            settings,
            store,
            reconciler,
            use_cases: UseCases { state },
        }
    }

    /// App backed by one JSON file per campaign under `settings.state_dir`.
    pub fn with_file_store(settings: EngineSettings) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(JsonFileStateStore::new(settings.state_dir.clone()));
        Self::new(settings, store, Arc::new(SystemClock::new()))
    }

    /// App backed by process memory only.
    pub fn in_memory(settings: EngineSettings) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new(clock.clone()));
        Self::new(settings, store, clock)
    }
}
