use std::sync::Arc;

use karnameh_cache::{CacheConfig, RedisCache};
use karnameh_config::{CorsConfig, GradingConfig};
use karnameh_grading::AssessmentScale;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::store::{PgRecordStore, RecordStore};

#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub scale: Arc<AssessmentScale>,
    pub grading_config: GradingConfig,
    pub cors_config: CorsConfig,
    pub cache_config: CacheConfig,
    /// `None` when caching is disabled or Redis was unreachable at startup
    pub cache: Option<RedisCache>,
}

impl AppState {
    /// State without a cache, configured from the environment.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            scale: Arc::new(AssessmentScale::standard()),
            grading_config: GradingConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            cache_config: CacheConfig::from_env(),
            cache: None,
        }
    }

    pub fn cache(&self) -> Option<&RedisCache> {
        self.cache.as_ref()
    }
}

pub async fn init_app_state(db: PgPool) -> AppState {
    let mut state = AppState::new(Arc::new(PgRecordStore::new(db)));

    if state.cache_config.enabled {
        match RedisCache::connect(&state.cache_config).await {
            Ok(cache) => {
                info!(prefix = %cache.prefix(), "Redis cache connected");
                state.cache = Some(cache);
            }
            Err(e) => warn!(error = %e, "Redis unavailable, reports will not be cached"),
        }
    } else {
        info!("Report cache disabled");
    }

    state
}
