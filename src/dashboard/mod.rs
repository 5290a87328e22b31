#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod events;
pub mod state;

pub use controller::{DashboardController, DashboardSnapshot};
pub use events::{LogEmitter, StateEmitter, STATE_CHANGED_EVENT};
pub use state::{DashboardTab, RecommendationLoadState, SessionMachine, SessionView};
