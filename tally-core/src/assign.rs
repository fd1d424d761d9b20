//! Manual category assignment over the working set

use crate::record::{Category, TransactionRecord};
use tracing::{debug, warn};

/// What an assignment actually touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignReport {
    /// Indices that received the category, in the order given
    pub applied: Vec<usize>,
    /// Indices that were past the end of the working set
    pub ignored: Vec<usize>,
}

impl AssignReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Tag every record at `indices` with `category`.
///
/// Indices refer to the current in-memory order. Out-of-range indices are
/// skipped and reported rather than treated as an error.
pub fn assign_category(
    records: &mut [TransactionRecord],
    indices: &[usize],
    category: Category,
) -> AssignReport {
    let mut report = AssignReport::default();

    for &idx in indices {
        match records.get_mut(idx) {
            Some(record) => {
                record.category = Some(category);
                report.applied.push(idx);
            }
            None => report.ignored.push(idx),
        }
    }

    if !report.ignored.is_empty() {
        warn!(
            ignored = ?report.ignored,
            len = records.len(),
            "skipping out-of-range rows"
        );
    }
    debug!(%category, applied = report.applied.len(), "assigned category");

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<TransactionRecord> {
        vec![
            TransactionRecord::new("2024-05-01", "Grocer", 100.0),
            TransactionRecord::new("2024-05-02", "Bakery", 200.0),
            TransactionRecord::new("2024-05-03", "Power Co", 50.0),
        ]
    }

    #[test]
    fn test_assign_selected_rows_only() {
        let mut records = sample();
        let report = assign_category(&mut records, &[0, 1], Category::Food);

        assert_eq!(report.applied, vec![0, 1]);
        assert!(report.ignored.is_empty());
        assert_eq!(records[0].category, Some(Category::Food));
        assert_eq!(records[1].category, Some(Category::Food));
        assert_eq!(records[2].category, None);
    }

    #[test]
    fn test_reassign_overwrites() {
        let mut records = sample();
        assign_category(&mut records, &[2], Category::Food);
        assign_category(&mut records, &[2], Category::Utilities);
        assert_eq!(records[2].category, Some(Category::Utilities));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut records = sample();
        let report = assign_category(&mut records, &[1, 7], Category::Gas);

        assert_eq!(report.applied, vec![1]);
        assert_eq!(report.ignored, vec![7]);
        assert_eq!(records[1].category, Some(Category::Gas));
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let mut records = sample();
        let before = records.clone();
        let report = assign_category(&mut records, &[], Category::Water);

        assert!(report.is_noop());
        assert_eq!(records, before);
    }
}
