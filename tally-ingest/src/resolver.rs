//! Fuzzy mapping from statement headers to the canonical columns.
//!
//! Card issuers label the same column differently (`利用日`, `日付`, `Date`,
//! ...). Each canonical field carries a ranked alias list; the first alias
//! that lands close enough to some header decides the column.

use serde::{Deserialize, Serialize};
use tally_core::{CanonicalField, Result, TallyError};
use tracing::debug;

use crate::similarity::ratio;

/// Minimum similarity for a header to count as a match
pub const DEFAULT_CUTOFF: f64 = 0.6;

/// Ranked header aliases per canonical field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAliases {
    pub date: Vec<String>,
    pub description: Vec<String>,
    pub amount: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        fn owned(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| s.to_string()).collect()
        }
        Self {
            date: owned(&[
                "利用日",
                "日付",
                "購入日",
                "取引日",
                "Date",
                "Transaction Date",
                "Posted Date",
            ]),
            description: owned(&[
                "商品名",
                "内容",
                "品名",
                "摘要",
                "利用店名",
                "Description",
                "Store",
                "Merchant",
                "Item",
            ]),
            amount: owned(&["料金", "金額", "支出", "金額（円）", "Amount", "Price", "Charge"]),
        }
    }
}

impl FieldAliases {
    pub fn for_field(&self, field: CanonicalField) -> &[String] {
        match field {
            CanonicalField::Date => &self.date,
            CanonicalField::Description => &self.description,
            CanonicalField::Amount => &self.amount,
        }
    }

    /// Append lower-priority aliases for `field`, skipping ones already present
    pub fn extend(&mut self, field: CanonicalField, extra: impl IntoIterator<Item = String>) {
        let list = match field {
            CanonicalField::Date => &mut self.date,
            CanonicalField::Description => &mut self.description,
            CanonicalField::Amount => &mut self.amount,
        };
        for alias in extra {
            if !alias.trim().is_empty() && !list.contains(&alias) {
                list.push(alias);
            }
        }
    }
}

/// The header chosen for one canonical field
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    /// Header text as it appears in the file
    pub header: String,
    /// Zero-based column position
    pub index: usize,
    /// Alias that produced the match
    pub alias: String,
    pub score: f64,
}

/// Column positions for all three canonical fields
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub date: ResolvedColumn,
    pub description: ResolvedColumn,
    pub amount: ResolvedColumn,
}

impl ColumnMap {
    pub fn get(&self, field: CanonicalField) -> &ResolvedColumn {
        match field {
            CanonicalField::Date => &self.date,
            CanonicalField::Description => &self.description,
            CanonicalField::Amount => &self.amount,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColumnResolver {
    aliases: FieldAliases,
    cutoff: f64,
}

impl Default for ColumnResolver {
    fn default() -> Self {
        Self::new(FieldAliases::default())
    }
}

impl ColumnResolver {
    pub fn new(aliases: FieldAliases) -> Self {
        Self {
            aliases,
            cutoff: DEFAULT_CUTOFF,
        }
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff.clamp(0.0, 1.0);
        self
    }

    pub fn aliases(&self) -> &FieldAliases {
        &self.aliases
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Map every canonical field to a header, failing on the first field
    /// (in date, description, amount order) that has no acceptable match.
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Result<ColumnMap> {
        Ok(ColumnMap {
            date: self.resolve_field(headers, CanonicalField::Date)?,
            description: self.resolve_field(headers, CanonicalField::Description)?,
            amount: self.resolve_field(headers, CanonicalField::Amount)?,
        })
    }

    pub fn resolve_field<S: AsRef<str>>(
        &self,
        headers: &[S],
        field: CanonicalField,
    ) -> Result<ResolvedColumn> {
        for alias in self.aliases.for_field(field) {
            if let Some((index, score)) = self.closest(headers, alias) {
                let header = headers[index].as_ref().to_string();
                debug!(%field, %alias, %header, score, "resolved column");
                return Ok(ResolvedColumn {
                    header,
                    index,
                    alias: alias.clone(),
                    score,
                });
            }
        }
        Err(TallyError::ColumnNotFound(field))
    }

    /// Best header for a single alias, if it clears the cutoff.
    /// Equal scores keep the earliest header.
    fn closest<S: AsRef<str>>(&self, headers: &[S], alias: &str) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (index, header) in headers.iter().enumerate() {
            let score = ratio(header.as_ref(), alias);
            if score < self.cutoff {
                continue;
            }
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((index, score));
            }
        }
        best
    }
}
