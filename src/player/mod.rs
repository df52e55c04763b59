pub mod events;
pub mod traits;
pub mod types;

pub use events::EngineEvent;
pub use traits::{MediaEngine, NoOverlay, OverlaySync};
pub use types::{AspectMode, Chapter};
