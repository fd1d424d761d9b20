//! The working session: one statement's rows, their categories, and where
//! they came from. Every user action goes through here.

use std::path::{Path, PathBuf};

use tally_core::{
    assign_category, pie_chart, summarize, AssignReport, Category, PaymentMonth, PieChart, Result,
    SessionState, Summary, TallyError, TransactionRecord,
};
use tally_ingest::{load_statement, ColumnResolver};
use tracing::{info, warn};

use crate::snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotStore};

/// Result of tagging rows
#[derive(Debug)]
pub struct AssignOutcome {
    pub report: AssignReport,
    /// Summary recomputed after the change
    pub summary: Summary,
    /// Set when the automatic snapshot could not be written. The assignment
    /// itself still stands.
    pub snapshot_error: Option<TallyError>,
}

#[derive(Debug)]
pub struct Session {
    records: Vec<TransactionRecord>,
    payment_month: PaymentMonth,
    source: Option<PathBuf>,
    store: SnapshotStore,
    resolver: ColumnResolver,
}

impl Session {
    pub fn new(store: SnapshotStore, resolver: ColumnResolver) -> Self {
        Self {
            records: Vec::new(),
            payment_month: PaymentMonth::Unknown,
            source: None,
            store,
            resolver,
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn payment_month(&self) -> &PaymentMonth {
        &self.payment_month
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        SessionState::of(&self.records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the working set with a freshly loaded statement.
    /// On failure the current rows are kept as they were.
    pub fn load_statement(&mut self, path: impl AsRef<Path>) -> Result<Summary> {
        let path = path.as_ref();
        let statement = load_statement(path, &self.resolver)?;

        self.records = statement.records;
        self.payment_month = PaymentMonth::from_path(path);
        self.source = Some(path.to_path_buf());
        info!(month = %self.payment_month, rows = self.records.len(), "session loaded");
        Ok(self.summary())
    }

    /// Tag rows, recompute the summary, then persist the snapshot.
    pub fn assign(&mut self, indices: &[usize], category: Category) -> Result<AssignOutcome> {
        if self.records.is_empty() {
            return Err(TallyError::NoData);
        }

        let report = assign_category(&mut self.records, indices, category);
        let summary = self.summary();

        let snapshot_error = if report.is_noop() {
            None
        } else {
            self.save().err().inspect(|e| warn!(error = %e, "auto-save failed"))
        };

        Ok(AssignOutcome {
            report,
            summary,
            snapshot_error,
        })
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.records)
    }

    /// Chart input, refused while the set is empty or partly untagged
    pub fn chart(&self) -> Result<PieChart> {
        pie_chart(&self.records, &self.payment_month)
    }

    /// Write the snapshot to the store's well-known path
    pub fn save(&self) -> Result<PathBuf> {
        self.store
            .save(&self.records, &self.payment_month, self.source.as_deref())?;
        Ok(self.store.path().to_path_buf())
    }

    /// Write the snapshot somewhere else
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        write_snapshot(path, &self.records, &self.payment_month, self.source.as_deref())?;
        Ok(path.to_path_buf())
    }

    /// Resume from the well-known snapshot
    pub fn restore(&mut self) -> Result<Summary> {
        let snapshot = self.store.load()?;
        Ok(self.apply(snapshot))
    }

    /// Resume from a snapshot at an arbitrary path
    pub fn restore_from(&mut self, path: impl AsRef<Path>) -> Result<Summary> {
        let snapshot = read_snapshot(path.as_ref())?;
        Ok(self.apply(snapshot))
    }

    fn apply(&mut self, snapshot: Snapshot) -> Summary {
        self.records = snapshot.records;
        self.payment_month = snapshot.payment_month;
        self.source = snapshot.source;
        info!(month = %self.payment_month, rows = self.records.len(), "session restored");
        self.summary()
    }
}
