use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::password::hash_password_async;
use crate::config::AppConfig;
use crate::users::repo::UserStore;

/// Password of every demo member.
pub const DEMO_PASSWORD: &str = "password123";

/// Shared handle to the member store. Take the write guard for any
/// check-then-write sequence so it is atomic.
pub type SharedStore = Arc<RwLock<UserStore>>;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let store = if config.seed_demo_users {
            let hash = hash_password_async(DEMO_PASSWORD.into()).await?;
            let store = UserStore::with_demo_users(&hash);
            tracing::info!(members = store.len(), "seeded demo members");
            store
        } else {
            UserStore::new()
        };
        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: UserStore, config: AppConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            config: Arc::new(config),
        }
    }
}
