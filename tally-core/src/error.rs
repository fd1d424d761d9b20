//! Error kinds surfaced to the presentation layer

use std::fmt;

/// One of the three normalized statement fields every record must populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Date,
    Description,
    Amount,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 3] = [
        CanonicalField::Date,
        CanonicalField::Description,
        CanonicalField::Amount,
    ];

    /// Column name used in normalized output and snapshots
    pub fn column_name(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Description => "description",
            CanonicalField::Amount => "amount",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Every failure the core can report. None of them are fatal; callers keep
/// whatever state they had before the failed operation.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("no column matching '{0}' was found")]
    ColumnNotFound(CanonicalField),

    #[error("could not read statement: {0}")]
    ParseFailure(String),

    #[error("could not read snapshot: {0}")]
    SnapshotReadFailure(String),

    #[error("could not write snapshot: {0}")]
    SnapshotWriteFailure(String),

    #[error("no data loaded")]
    NoData,

    #[error("{uncategorized} row(s) still need a category")]
    IncompleteCategorization { uncategorized: usize },
}

pub type Result<T, E = TallyError> = std::result::Result<T, E>;
