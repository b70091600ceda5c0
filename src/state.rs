use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::media::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub media: MediaStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let media = MediaStore::new(
            config.upload_dir.clone(),
            config.staging_dir.clone(),
            config.root_path.clone(),
        );
        Self {
            db,
            media,
            config: Arc::new(config),
        }
    }
}
