//! Plain-text rendering for the non-interactive commands

use tally_core::{format_amount, PaymentMonth, PieChart, Summary, TransactionRecord};

const BAR_WIDTH: usize = 30;

pub fn render_table(records: &[TransactionRecord]) -> String {
    let desc_width = records
        .iter()
        .map(|r| r.description.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(11, 40);

    let mut out = format!(
        "{:>4}  {:<12}  {:<desc_width$}  {:>10}  {}\n",
        "#", "date", "description", "amount", "category"
    );
    for (i, r) in records.iter().enumerate() {
        let desc: String = r.description.chars().take(desc_width).collect();
        out.push_str(&format!(
            "{:>4}  {:<12}  {:<desc_width$}  {:>10}  {}\n",
            i,
            r.date,
            desc,
            format_amount(r.amount),
            r.category_label()
        ));
    }
    out
}

pub fn render_summary(summary: &Summary, month: &PaymentMonth) -> String {
    let mut out = format!("Payment month: {month}\n");
    let total = summary.total_line();
    if !total.is_empty() {
        out.push_str(&total);
        out.push('\n');
    }
    for line in summary.lines() {
        out.push_str("  ");
        out.push_str(&line);
        out.push('\n');
    }
    if summary.uncategorized_count > 0 {
        out.push_str(&format!(
            "  ({} uncategorized: {} yen)\n",
            summary.uncategorized_count,
            format_amount(summary.uncategorized_amount)
        ));
    }
    out
}

/// Horizontal bar per slice, widest slice last
pub fn render_chart(chart: &PieChart) -> String {
    let label_width = chart
        .slices
        .iter()
        .map(|s| s.label().chars().count())
        .max()
        .unwrap_or(0);

    let bar_width = BAR_WIDTH;
    let mut out = format!("{}\n", chart.title);
    for slice in &chart.slices {
        let filled = ((slice.percent / 100.0) * bar_width as f64).round().max(0.0) as usize;
        out.push_str(&format!(
            "  {:<label_width$}  {:<bar_width$}  {:>6}\n",
            slice.label(),
            "#".repeat(filled.min(bar_width)),
            slice.percent_label()
        ));
    }
    out
}
