pub mod events;
pub mod refresh;
pub mod state;

pub use events::EventsService;
pub use refresh::RefreshService;
pub use state::{apply_pipeline, DashboardState};
