//! RateWatch dashboard
//!
//! Single-page view over the latest rate snapshot, with one manual refresh
//! action and a JSON endpoint for scripts.

pub mod config;
pub mod render;
pub mod routes;
pub mod session;

pub use config::DashboardConfig;
pub use routes::router;
pub use session::Session;
