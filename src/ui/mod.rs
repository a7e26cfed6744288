//! Terminal dashboard: filter sidebar, filtered table, column panel and notices

pub mod app;
pub mod components;
pub mod state;

pub use app::{run_app, DashboardApp};
pub use state::{Action, DashboardState, Focus};
