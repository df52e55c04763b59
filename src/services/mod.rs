pub mod series;
pub mod stores;

pub use series::{FolderSeriesResolver, NoSeries, SeriesResolver, is_remote_identifier};
pub use stores::{HistoryStore, PositionStore, PreferenceStore, SessionStores, SkipConfigStore};
