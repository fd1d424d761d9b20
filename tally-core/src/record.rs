//! Transaction record types and the fixed category set

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of a card statement after normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    /// Date as printed on the statement (not parsed)
    pub date: String,
    /// Store or item name
    pub description: String,
    /// Charged amount in whole currency units by convention
    pub amount: f64,
    /// Assigned spending category, `None` until the user tags the row
    pub category: Option<Category>,
}

impl TransactionRecord {
    /// Create an uncategorized record
    pub fn new(date: impl Into<String>, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            amount,
            category: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn is_categorized(&self) -> bool {
        self.category.is_some()
    }

    /// Category label as stored in CSV form (empty when unassigned)
    pub fn category_label(&self) -> &'static str {
        self.category.map(|c| c.label()).unwrap_or("")
    }
}

/// Spending categories a transaction can be tagged with
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    #[serde(rename = "food")]
    Food,
    #[serde(rename = "utilities")]
    Utilities,
    #[serde(rename = "transport")]
    Transport,
    #[serde(rename = "communications")]
    Communications,
    #[serde(rename = "household")]
    Household,
    #[serde(rename = "entertainment")]
    Entertainment,
    #[serde(rename = "education")]
    Education,
    #[serde(rename = "gas")]
    Gas,
    #[serde(rename = "water")]
    Water,
    #[serde(rename = "sundries")]
    Sundries,
    #[serde(rename = "advances")]
    Advances,
}

impl Category {
    /// All categories in display order
    pub const ALL: [Category; 11] = [
        Category::Food,
        Category::Utilities,
        Category::Transport,
        Category::Communications,
        Category::Household,
        Category::Entertainment,
        Category::Education,
        Category::Gas,
        Category::Water,
        Category::Sundries,
        Category::Advances,
    ];

    /// Lowercase label used in snapshots and on screen
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Utilities => "utilities",
            Category::Transport => "transport",
            Category::Communications => "communications",
            Category::Household => "household",
            Category::Entertainment => "entertainment",
            Category::Education => "education",
            Category::Gas => "gas",
            Category::Water => "water",
            Category::Sundries => "sundries",
            Category::Advances => "advances",
        }
    }

    /// Label used by older Japanese-language snapshots
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Category::Food => "食費",
            Category::Utilities => "電気代",
            Category::Transport => "交通費",
            Category::Communications => "情報通信費",
            Category::Household => "日用雑貨",
            Category::Entertainment => "遊戯",
            Category::Education => "学業",
            Category::Gas => "ガス代",
            Category::Water => "水道代",
            Category::Sundries => "雑貨",
            Category::Advances => "立替金",
        }
    }

    /// Position in [`Category::ALL`]
    pub fn index(&self) -> usize {
        Category::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    pub fn next(&self) -> Category {
        Category::ALL[(self.index() + 1) % Category::ALL.len()]
    }

    pub fn prev(&self) -> Category {
        let n = Category::ALL.len();
        Category::ALL[(self.index() + n - 1) % n]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s) || c.legacy_label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Outcome of turning a raw amount cell into a number.
///
/// Unparseable input never fails a load; it becomes zero with `defaulted` set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoercedAmount {
    pub value: f64,
    pub defaulted: bool,
}

/// Coerce a raw amount cell. Non-numeric or non-finite input yields `0.0`.
pub fn coerce_amount(raw: &str) -> CoercedAmount {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => CoercedAmount {
            value: v,
            defaulted: false,
        },
        _ => CoercedAmount {
            value: 0.0,
            defaulted: true,
        },
    }
}

/// Render an amount truncated to whole units with thousands separators,
/// e.g. `1234567.9` -> `"1,234,567"`.
pub fn format_amount(amount: f64) -> String {
    let whole = amount.trunc() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_uncategorized() {
        let r = TransactionRecord::new("2024-05-01", "Coffee Shop", 350.0);
        assert!(!r.is_categorized());
        assert_eq!(r.category_label(), "");

        let r = r.with_category(Category::Food);
        assert_eq!(r.category_label(), "food");
    }

    #[test]
    fn test_category_parse_accepts_both_label_sets() {
        assert_eq!("food".parse::<Category>(), Ok(Category::Food));
        assert_eq!("Utilities".parse::<Category>(), Ok(Category::Utilities));
        assert_eq!("交通費".parse::<Category>(), Ok(Category::Transport));
        assert_eq!("立替金".parse::<Category>(), Ok(Category::Advances));
        assert!("rent".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_cycle_wraps() {
        assert_eq!(Category::Food.prev(), Category::Advances);
        assert_eq!(Category::Advances.next(), Category::Food);
        assert_eq!(Category::Food.next(), Category::Utilities);
        assert_eq!(Category::ALL.len(), 11);
    }

    #[test]
    fn test_coerce_valid_numbers() {
        assert_eq!(coerce_amount("350").value, 350.0);
        assert_eq!(coerce_amount(" -12.5 ").value, -12.5);
        assert!(!coerce_amount("1e3").defaulted);
    }

    #[test]
    fn test_coerce_invalid_is_zero() {
        for raw in ["", "abc", "1,000", "¥350", "NaN", "inf"] {
            let c = coerce_amount(raw);
            assert_eq!(c.value, 0.0, "{raw:?} should coerce to zero");
            assert!(c.defaulted, "{raw:?} should be flagged");
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(350.0), "350");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1234567.9), "1,234,567");
        assert_eq!(format_amount(-4500.7), "-4,500");
    }

    #[test]
    fn test_serde_uses_lowercase_labels() {
        let json = serde_json::to_string(&Category::Communications).unwrap();
        assert_eq!(json, "\"communications\"");
    }
}
