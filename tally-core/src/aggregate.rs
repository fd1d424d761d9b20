//! Category totals and pie-chart input

use crate::error::{Result, TallyError};
use crate::month::PaymentMonth;
use crate::record::{format_amount, Category, TransactionRecord};
use serde::Serialize;
use std::collections::HashMap;

/// Summed amount for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
    pub count: usize,
}

/// Aggregated view of the working set
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Summary {
    /// Categorized records only, ascending by amount
    pub by_category: Vec<CategoryTotal>,
    /// Sum over records that have no category yet
    pub uncategorized_amount: f64,
    pub uncategorized_count: usize,
    pub record_count: usize,
    /// Sum over every record; `None` when nothing is loaded
    pub total: Option<f64>,
}

impl Summary {
    pub fn amount_for(&self, category: Category) -> Option<f64> {
        self.by_category
            .iter()
            .find(|t| t.category == category)
            .map(|t| t.amount)
    }

    /// Sum of the per-category totals
    pub fn categorized_total(&self) -> f64 {
        self.by_category.iter().map(|t| t.amount).sum()
    }

    pub fn is_fully_categorized(&self) -> bool {
        self.record_count > 0 && self.uncategorized_count == 0
    }

    /// One `"<category>: <amount> yen"` line per category
    pub fn lines(&self) -> Vec<String> {
        self.by_category
            .iter()
            .map(|t| format!("{}: {} yen", t.category, format_amount(t.amount)))
            .collect()
    }

    /// `"Total: <amount> yen"`, or blank when nothing is loaded
    pub fn total_line(&self) -> String {
        match self.total {
            Some(total) => format!("Total: {} yen", format_amount(total)),
            None => String::new(),
        }
    }
}

/// Group the working set by category and sum amounts.
pub fn summarize(records: &[TransactionRecord]) -> Summary {
    if records.is_empty() {
        return Summary::default();
    }

    let mut groups: HashMap<Category, (f64, usize)> = HashMap::new();
    let mut uncategorized_amount = 0.0;
    let mut uncategorized_count = 0;

    for record in records {
        match record.category {
            Some(category) => {
                let entry = groups.entry(category).or_insert((0.0, 0));
                entry.0 += record.amount;
                entry.1 += 1;
            }
            None => {
                uncategorized_amount += record.amount;
                uncategorized_count += 1;
            }
        }
    }

    let mut by_category: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(category, (amount, count))| CategoryTotal {
            category,
            amount,
            count,
        })
        .collect();
    by_category.sort_by(|a, b| {
        a.amount
            .total_cmp(&b.amount)
            .then_with(|| a.category.cmp(&b.category))
    });

    Summary {
        by_category,
        uncategorized_amount,
        uncategorized_count,
        record_count: records.len(),
        total: Some(records.iter().map(|r| r.amount).sum()),
    }
}

/// One wedge of the pie chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub category: Category,
    pub amount: f64,
    /// Share of the total in percent (0-100)
    pub percent: f64,
}

impl PieSlice {
    /// `"<category>: <amount> yen"`
    pub fn label(&self) -> String {
        format!("{}: {} yen", self.category, format_amount(self.amount))
    }

    /// Percentage with one decimal, e.g. `"33.3%"`
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent)
    }
}

/// Everything a chart renderer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    /// Ascending by amount
    pub slices: Vec<PieSlice>,
    pub total: f64,
    pub title: String,
}

/// Build chart input. Refused when nothing is loaded or any row lacks a category.
pub fn pie_chart(records: &[TransactionRecord], payment_month: &PaymentMonth) -> Result<PieChart> {
    if records.is_empty() {
        return Err(TallyError::NoData);
    }

    let summary = summarize(records);
    if summary.uncategorized_count > 0 {
        return Err(TallyError::IncompleteCategorization {
            uncategorized: summary.uncategorized_count,
        });
    }

    let total = summary.categorized_total();
    let slices = summary
        .by_category
        .iter()
        .map(|t| PieSlice {
            category: t.category,
            amount: t.amount,
            percent: if total != 0.0 { t.amount / total * 100.0 } else { 0.0 },
        })
        .collect();

    Ok(PieChart {
        slices,
        total,
        title: format!(
            "Spending by category ({}) total: {} yen",
            payment_month,
            format_amount(total)
        ),
    })
}
