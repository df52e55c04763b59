pub mod history_repository;
pub mod position_repository;
pub mod preference_repository;
pub mod skip_config_repository;

use crate::db::DatabaseConnection;

/// Base repository implementation holder
#[derive(Debug)]
pub struct BaseRepository {
    pub db: DatabaseConnection,
}

impl BaseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub use history_repository::HistoryRepositoryImpl;
pub use position_repository::PositionRepositoryImpl;
pub use preference_repository::PreferenceRepositoryImpl;
pub use skip_config_repository::SkipConfigRepositoryImpl;

/// Seconds to whole milliseconds, as stored in every table
pub(crate) fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}
