//! Sync pipeline.
//!
//! - `fetch`: Sheet export sources
//! - `parse`: Delimited text to rows
//! - `guard`: Refuses empty or collapsed exports
//! - `sync`: One fetch-parse-replace run
//! - `scheduler`: Periodic runs with graceful shutdown

pub mod fetch;
pub mod guard;
pub mod parse;
pub mod scheduler;
pub mod sync;

pub use fetch::{FileSheetSource, HttpSheetSource, SheetSource, StaticSheetSource};
pub use guard::{GuardDecision, SyncGuard};
pub use parse::{SheetRow, parse_records};
pub use scheduler::Scheduler;
pub use sync::{SyncJob, SyncOutcome, SyncReport};
