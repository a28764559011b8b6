//! Pipeline entry points for the catalog watcher.
//!
//! - `ChangeDetector` / `SharedDetector`: one fetch, diff, persist, notify cycle
//! - `Scheduler`: periodic cycles inside the active window
//! - `run_check`: one cycle on demand
//! - `run_list`: read-only catalog listing

pub mod check;
pub mod context;
pub mod detect;
pub mod list;
pub mod schedule;

#[cfg(test)]
pub(crate) mod testing;

pub use check::run_check;
pub use context::AppContext;
pub use detect::{ChangeDetector, CycleReport, SharedDetector, classify};
pub use list::{Listing, run_list};
pub use schedule::{Scheduler, TickOutcome};
