pub mod errors;
pub mod natural_sort;

pub use errors::{SessionError, SessionResult};
pub use natural_sort::natural_cmp;
