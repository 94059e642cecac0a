//! Terminal dashboard.
//!
//! Polls the snapshot endpoint, keeps rolling CPU and memory windows plus a
//! short recent-log table, and redraws after every successful poll.

mod poller;
mod render;
mod series;
mod table;

pub use poller::{DashboardPoller, DEFAULT_POLL_INTERVAL_MS};
pub use render::{Render, TerminalRenderer};
pub use series::DEFAULT_WINDOW;
