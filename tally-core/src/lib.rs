//! tally-core: statement record types, category assignment, aggregation and
//! payment-month inference

pub mod aggregate;
pub mod assign;
pub mod error;
pub mod month;
pub mod record;

pub use aggregate::{pie_chart, summarize, CategoryTotal, PieChart, PieSlice, Summary};
pub use assign::{assign_category, AssignReport};
pub use error::{CanonicalField, Result, TallyError};
pub use month::PaymentMonth;
pub use record::{coerce_amount, format_amount, Category, CoercedAmount, TransactionRecord};

/// Where a session sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing loaded
    Empty,
    /// Rows loaded, none tagged yet
    Loaded,
    /// Some rows tagged
    Categorized,
    /// Every row tagged; a chart can be drawn
    ChartReady,
}

impl SessionState {
    pub fn of(records: &[TransactionRecord]) -> Self {
        if records.is_empty() {
            return SessionState::Empty;
        }
        let tagged = records.iter().filter(|r| r.is_categorized()).count();
        if tagged == records.len() {
            SessionState::ChartReady
        } else if tagged > 0 {
            SessionState::Categorized
        } else {
            SessionState::Loaded
        }
    }
}
