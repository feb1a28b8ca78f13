use std::path::PathBuf;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::cache::PageCache;
use crate::config::Config;
use crate::textgen::TextGenerator;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub media_dir: PathBuf,
    pub cache: PageCache,
    pub textgen: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(db: DbPool, config: Config, textgen: Arc<dyn TextGenerator>) -> Self {
        let cache = PageCache::new(config.cache.home_ttl());
        let media_dir = config.media_path();
        Self {
            db,
            config,
            media_dir,
            cache,
            textgen,
        }
    }
}
