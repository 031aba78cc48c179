use std::sync::Arc;

use reelsync_core::{
    Authenticator, CascadeDeleter, CatalogStore, Config, SanitizedConfig, SyncJob, SyncScheduler,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn CatalogStore>,
    sync_job: Arc<SyncJob>,
    cascade: CascadeDeleter,
    scheduler: Option<Arc<SyncScheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn CatalogStore>,
        sync_job: Arc<SyncJob>,
        scheduler: Option<Arc<SyncScheduler>>,
    ) -> Self {
        let cascade = CascadeDeleter::new(Arc::clone(&store));
        Self {
            config,
            authenticator,
            store,
            sync_job,
            cascade,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub fn sync_job(&self) -> &SyncJob {
        self.sync_job.as_ref()
    }

    pub fn cascade(&self) -> &CascadeDeleter {
        &self.cascade
    }

    pub fn scheduler(&self) -> Option<&SyncScheduler> {
        self.scheduler.as_deref()
    }
}
