use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::DashboardConfig;
use crate::services::dashboard::DashboardService;
use crate::services::sim_client::FetchError;
use crate::types::models::DashboardSnapshot;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub dashboard: DashboardService,
    /// Most recent successful refresh. Replaced whole, never edited.
    latest: RwLock<Option<Arc<DashboardSnapshot>>>,
}

impl AppState {
    pub fn new(config: Arc<DashboardConfig>) -> SharedState {
        Arc::new(Self {
            dashboard: DashboardService::new(config),
            latest: RwLock::new(None),
        })
    }

    pub async fn refresh(&self) -> Result<Arc<DashboardSnapshot>, FetchError> {
        let snapshot = Arc::new(self.dashboard.refresh().await?);
        *self.latest.write().await = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub async fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.latest.read().await.clone()
    }
}
