//! Flat CSV snapshot of a working session.
//!
//! Layout: `date,description,amount,category,_payment_month,_source_file`.
//! The two metadata columns repeat on every row. Files without them (or with
//! the Japanese column names older snapshots used) still load.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use tally_core::{coerce_amount, Category, PaymentMonth, Result, TallyError, TransactionRecord};
use tracing::{debug, info};

pub const SNAPSHOT_HEADER: [&str; 6] = [
    "date",
    "description",
    "amount",
    "category",
    "_payment_month",
    "_source_file",
];

const SNAPSHOT_DIR: &str = "tally";
const SNAPSHOT_FILE: &str = "temp_output.csv";

/// A restored session
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub records: Vec<TransactionRecord>,
    pub payment_month: PaymentMonth,
    /// Statement the session was loaded from, when recorded
    pub source: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SnapshotRowOut<'a> {
    date: &'a str,
    description: &'a str,
    amount: f64,
    category: &'a str,
    payment_month: &'a str,
    source_file: &'a str,
}

#[derive(Debug, Deserialize)]
struct SnapshotRowIn {
    #[serde(alias = "利用日")]
    date: String,
    #[serde(alias = "商品名")]
    description: String,
    #[serde(alias = "料金")]
    amount: String,
    #[serde(default, alias = "カテゴリ")]
    category: Option<String>,
    #[serde(default, rename = "_payment_month", alias = "_支払月")]
    payment_month: Option<String>,
    #[serde(default, rename = "_source_file", alias = "_元ファイル")]
    source_file: Option<String>,
}

/// Snapshot file at one fixed location
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<system temp dir>/tally/temp_output.csv`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(SNAPSHOT_DIR).join(SNAPSHOT_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn save(
        &self,
        records: &[TransactionRecord],
        payment_month: &PaymentMonth,
        source: Option<&Path>,
    ) -> Result<()> {
        write_snapshot(&self.path, records, payment_month, source)
    }

    pub fn load(&self) -> Result<Snapshot> {
        read_snapshot(&self.path)
    }
}

/// Write a snapshot, creating the parent directory if needed.
pub fn write_snapshot(
    path: &Path,
    records: &[TransactionRecord],
    payment_month: &PaymentMonth,
    source: Option<&Path>,
) -> Result<()> {
    let fail = |e: &dyn std::fmt::Display| {
        TallyError::SnapshotWriteFailure(format!("{}: {}", path.display(), e))
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| fail(&e))?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| fail(&e))?;
    wtr.write_record(SNAPSHOT_HEADER).map_err(|e| fail(&e))?;

    let month = payment_month.to_string();
    let source = source.map(|p| p.to_string_lossy()).unwrap_or_default();
    for record in records {
        wtr.serialize(SnapshotRowOut {
            date: &record.date,
            description: &record.description,
            amount: record.amount,
            category: record.category_label(),
            payment_month: &month,
            source_file: &source,
        })
        .map_err(|e| fail(&e))?;
    }
    wtr.flush().map_err(|e| fail(&e))?;

    info!(path = %path.display(), rows = records.len(), "wrote snapshot");
    Ok(())
}

/// Read a snapshot from disk.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let file = File::open(path).map_err(|e| {
        TallyError::SnapshotReadFailure(format!("opening {}: {}", path.display(), e))
    })?;
    let snapshot = read_snapshot_from(file).map_err(|e| match e {
        TallyError::SnapshotReadFailure(msg) => {
            TallyError::SnapshotReadFailure(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    info!(path = %path.display(), rows = snapshot.records.len(), "read snapshot");
    Ok(snapshot)
}

/// Parse snapshot CSV from any reader.
pub fn read_snapshot_from<R: Read>(reader: R) -> Result<Snapshot> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| TallyError::SnapshotReadFailure(e.to_string()))?;
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(TallyError::SnapshotReadFailure("empty file".to_string()));
    }

    let mut records = Vec::new();
    let mut payment_month = None;
    let mut source = None;

    for (line, result) in rdr.deserialize::<SnapshotRowIn>().enumerate() {
        let row = result
            .map_err(|e| TallyError::SnapshotReadFailure(format!("row {}: {}", line + 2, e)))?;

        let category = match row.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(label.parse::<Category>().map_err(|e| {
                TallyError::SnapshotReadFailure(format!("row {}: {}", line + 2, e))
            })?),
        };

        if line == 0 {
            payment_month = Some(
                row.payment_month
                    .as_deref()
                    .map(PaymentMonth::from_label)
                    .unwrap_or_default(),
            );
            source = row
                .source_file
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from);
        }

        records.push(TransactionRecord {
            date: row.date,
            description: row.description,
            amount: coerce_amount(&row.amount).value,
            category,
        });
    }

    debug!(rows = records.len(), ?payment_month, "parsed snapshot");
    Ok(Snapshot {
        records,
        payment_month: payment_month.unwrap_or_default(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn working_set() -> Vec<TransactionRecord> {
        vec![
            TransactionRecord::new("2024-05-01", "Coffee Shop", 350.0).with_category(Category::Food),
            TransactionRecord::new("2024-05-02", "Power, Inc.", 8400.0),
            TransactionRecord::new("2024-05-03", "Bus \"pass\"", 1200.5)
                .with_category(Category::Transport),
        ]
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested").join("snap.csv"));
        let month = PaymentMonth::Known { year: 2024, month: 5 };
        let source = PathBuf::from("/home/me/statement_2024-05.csv");

        store.save(&working_set(), &month, Some(&source)).unwrap();
        assert!(store.exists());

        let snap = store.load().unwrap();
        assert_eq!(snap.records, working_set());
        assert_eq!(snap.payment_month, month);
        assert_eq!(snap.source, Some(source));
    }

    #[test]
    fn test_metadata_repeats_on_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.csv");
        write_snapshot(&path, &working_set(), &PaymentMonth::Unknown, None).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,description,amount,category,_payment_month,_source_file")
        );
        assert!(lines.all(|l| l.ends_with(",unknown,")));
    }

    #[test]
    fn test_empty_working_set_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.csv");
        write_snapshot(&path, &[], &PaymentMonth::Unknown, None).unwrap();

        let snap = read_snapshot(&path).unwrap();
        assert!(snap.records.is_empty());
        assert_eq!(snap.payment_month, PaymentMonth::Unknown);
    }

    #[test]
    fn test_missing_metadata_columns() {
        let text = "date,description,amount,category\n05/01,Cafe,350,food\n05/02,Bus,x,\n";
        let snap = read_snapshot_from(text.as_bytes()).unwrap();
        assert_eq!(snap.payment_month, PaymentMonth::Unknown);
        assert_eq!(snap.source, None);
        assert_eq!(snap.records.len(), 2);
        assert_eq!(snap.records[0].category, Some(Category::Food));
        assert_eq!(snap.records[1].amount, 0.0);
        assert_eq!(snap.records[1].category, None);
    }

    #[test]
    fn test_legacy_japanese_snapshot() {
        let text = "\
利用日,商品名,料金,カテゴリ,_支払月,_元ファイル
2024/05/01,スーパー,1200.0,食費,2024年5月分,C:/card/202405.csv
2024/05/02,電力会社,8400.0,電気代,2024年5月分,C:/card/202405.csv
";
        let snap = read_snapshot_from(text.as_bytes()).unwrap();
        assert_eq!(snap.payment_month, PaymentMonth::Known { year: 2024, month: 5 });
        assert_eq!(snap.records[1].category, Some(Category::Utilities));
        assert_eq!(snap.records[0].amount, 1200.0);
        assert_eq!(snap.source, Some(PathBuf::from("C:/card/202405.csv")));
    }

    #[test]
    fn test_missing_file_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = SnapshotStore::new(dir.path().join("gone.csv")).load().unwrap_err();
        assert!(matches!(err, TallyError::SnapshotReadFailure(_)));
    }

    #[test]
    fn test_unknown_category_is_read_failure() {
        let text = "date,description,amount,category\n05/01,Cafe,350,rent\n";
        let err = read_snapshot_from(text.as_bytes()).unwrap_err();
        assert!(matches!(err, TallyError::SnapshotReadFailure(msg) if msg.contains("rent")));
    }

    #[test]
    fn test_missing_canonical_column_is_read_failure() {
        let text = "date,amount\n05/01,350\n";
        let err = read_snapshot_from(text.as_bytes()).unwrap_err();
        assert!(matches!(err, TallyError::SnapshotReadFailure(_)));
    }
}
