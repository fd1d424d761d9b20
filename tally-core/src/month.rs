//! Payment month inferred from a statement's file name

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

const UNKNOWN_LABEL: &str = "unknown";

/// Billing month label shown next to the summary.
///
/// Only ever derived from the file name, never checked against row dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentMonth {
    Known { year: u16, month: u8 },
    #[default]
    Unknown,
    /// A label recovered from a snapshot that does not follow either known form
    Other(String),
}

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(20\d{2})[-_/]?(0[1-9]|1[0-2])").expect("payment month pattern is valid")
    })
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(20\d{2})\s*(?:year|年)\s*(\d{1,2})\s*(?:month|月)")
            .expect("payment month label pattern is valid")
    })
}

impl PaymentMonth {
    /// Extract the payment month from the base name of `path`.
    /// The leftmost `YYYY[-_/]MM` token (2000-2099, 01-12) wins.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());

        match filename_re().captures(&name) {
            Some(caps) => {
                let year = caps[1].parse().unwrap_or_default();
                let month = caps[2].parse().unwrap_or_default();
                PaymentMonth::Known { year, month }
            }
            None => PaymentMonth::Unknown,
        }
    }

    /// Re-parse a label previously produced by [`fmt::Display`], or by older
    /// Japanese-language snapshots (`2024年5月分`, `不明`).
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case(UNKNOWN_LABEL)
            || trimmed.ends_with("不明")
        {
            return PaymentMonth::Unknown;
        }

        if let Some(caps) = label_re().captures(trimmed) {
            let year: u16 = caps[1].parse().unwrap_or_default();
            let month: u8 = caps[2].parse().unwrap_or_default();
            if (1..=12).contains(&month) {
                return PaymentMonth::Known { year, month };
            }
        }

        PaymentMonth::Other(trimmed.to_string())
    }

    pub fn is_known(&self) -> bool {
        matches!(self, PaymentMonth::Known { .. })
    }
}

impl fmt::Display for PaymentMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMonth::Known { year, month } => write!(f, "{year} year {month} month"),
            PaymentMonth::Unknown => f.write_str(UNKNOWN_LABEL),
            PaymentMonth::Other(label) => f.write_str(label),
        }
    }
}
