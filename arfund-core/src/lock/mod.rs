//! Weekly recommendation lock: on-disk record, storage seam, and the
//! once-per-ISO-week compute-or-reuse logic.

pub mod record;
pub mod store;
pub mod weekly;

pub use record::{LockRecord, LockedTrade};
pub use store::{FileLockStore, LockError, LockStore, MemoryLockStore};
pub use weekly::{
    resolve_anchor, LockParams, LockParamsError, LockSource, NoRecommendation, WeeklyLock,
    WeeklyOutcome,
};
