//! Read-only view over the latest gold snapshots.

mod reader;
mod render;

pub use reader::{DashboardError, DashboardReader, DashboardView, Snapshot};
pub use render::{empty_message, render};
