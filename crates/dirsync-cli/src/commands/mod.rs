//! Command implementations for dirsync-cli

mod console;
pub mod status;
pub mod sync;

pub use status::run_status;
pub use sync::{SyncArgs, run_sync};
