pub mod report;
pub mod sync;

pub use report::{AppSyncOutcome, OutcomeStatus, SyncResult};
pub use sync::{StoreFactory, SyncOptions, SyncService};
