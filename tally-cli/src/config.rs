use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use tally_core::{CanonicalField, Category};
use tally_ingest::{ColumnResolver, FieldAliases, DEFAULT_CUTOFF};
use tally_session::SnapshotStore;

use crate::state::ensure_tally_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub snapshot: SnapshotSection,
    pub columns: ColumnsSection,
    pub ui: UiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSection {
    /// Where the working session is auto-saved
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsSection {
    /// Minimum header similarity (0.0 - 1.0)
    pub cutoff: f64,
    /// Appended after the built-in aliases, lowest priority
    pub extra_date_aliases: Vec<String>,
    pub extra_description_aliases: Vec<String>,
    pub extra_amount_aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSection {
    /// Ask to resume the previous snapshot when the TUI starts
    pub ask_restore: bool,
    pub default_category: Category,
}

impl Default for SnapshotSection {
    fn default() -> Self {
        Self {
            path: SnapshotStore::default_path(),
        }
    }
}

impl Default for ColumnsSection {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            extra_date_aliases: Vec::new(),
            extra_description_aliases: Vec::new(),
            extra_amount_aliases: Vec::new(),
        }
    }
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            ask_restore: true,
            default_category: Category::Food,
        }
    }
}

impl Config {
    pub fn resolver(&self) -> ColumnResolver {
        let mut aliases = FieldAliases::default();
        aliases.extend(CanonicalField::Date, self.columns.extra_date_aliases.clone());
        aliases.extend(
            CanonicalField::Description,
            self.columns.extra_description_aliases.clone(),
        );
        aliases.extend(CanonicalField::Amount, self.columns.extra_amount_aliases.clone());
        ColumnResolver::new(aliases).with_cutoff(self.columns.cutoff)
    }

    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(self.snapshot.path.clone())
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg = parse_config(
            r#"
[columns]
cutoff = 0.7
extra_amount_aliases = ["Betrag"]

[ui]
default_category = "transport"
"#,
        )
        .unwrap();

        assert_eq!(cfg.columns.cutoff, 0.7);
        assert_eq!(cfg.ui.default_category, Category::Transport);
        assert!(cfg.ui.ask_restore);
        assert_eq!(cfg.snapshot.path, SnapshotStore::default_path());

        let resolver = cfg.resolver();
        assert_eq!(resolver.cutoff(), 0.7);
        assert_eq!(resolver.aliases().amount.last().map(String::as_str), Some("Betrag"));
    }

    #[test]
    fn test_empty_config_is_default() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.columns.cutoff, DEFAULT_CUTOFF);
        assert_eq!(cfg.ui.default_category, Category::Food);
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back = parse_config(&s).unwrap();
        assert_eq!(back.snapshot.path, Config::default().snapshot.path);
        assert_eq!(back.ui.default_category, Category::Food);
    }
}
