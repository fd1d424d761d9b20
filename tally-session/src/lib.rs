//! tally-session: the working session and its snapshot file

pub mod session;
pub mod snapshot;

pub use session::{AssignOutcome, Session};
pub use snapshot::{read_snapshot, read_snapshot_from, write_snapshot, Snapshot, SnapshotStore};
