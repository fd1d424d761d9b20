//! Read a card statement CSV into normalized transaction records.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tally_core::{coerce_amount, Result, TallyError, TransactionRecord};
use tracing::{debug, info};

use crate::resolver::{ColumnMap, ColumnResolver};

/// A parsed statement plus how its columns were matched
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Rows in file order, all uncategorized
    pub records: Vec<TransactionRecord>,
    pub columns: ColumnMap,
    /// Rows whose amount cell was not numeric and became zero
    pub defaulted_amounts: usize,
}

/// Load a statement file. Any failure leaves nothing half-built.
pub fn load_statement(path: impl AsRef<Path>, resolver: &ColumnResolver) -> Result<Statement> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| TallyError::ParseFailure(format!("opening {}: {}", path.display(), e)))?;

    let statement = read_statement(file, resolver).map_err(|e| match e {
        TallyError::ParseFailure(msg) => {
            TallyError::ParseFailure(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;

    info!(
        path = %path.display(),
        rows = statement.records.len(),
        defaulted = statement.defaulted_amounts,
        "loaded statement"
    );
    Ok(statement)
}

/// Parse statement CSV from any reader. The first row must be the header.
pub fn read_statement<R: Read>(reader: R, resolver: &ColumnResolver) -> Result<Statement> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| TallyError::ParseFailure(e.to_string()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(TallyError::ParseFailure("no header row".to_string()));
    }

    let columns = resolver.resolve(&headers)?;
    debug!(
        date = %columns.date.header,
        description = %columns.description.header,
        amount = %columns.amount.header,
        "column mapping"
    );

    let mut records = Vec::new();
    let mut defaulted_amounts = 0;

    for (line, result) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let row = result
            .map_err(|e| TallyError::ParseFailure(format!("row {}: {}", line + 2, e)))?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").to_string();

        let amount = coerce_amount(&cell(columns.amount.index));
        if amount.defaulted {
            defaulted_amounts += 1;
        }

        records.push(TransactionRecord::new(
            cell(columns.date.index),
            cell(columns.description.index),
            amount.value,
        ));
    }

    Ok(Statement {
        records,
        columns,
        defaulted_amounts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::CanonicalField;

    fn read(text: &str) -> Result<Statement> {
        read_statement(text.as_bytes(), &ColumnResolver::default())
    }

    #[test]
    fn test_single_row() {
        let st = read("Date,Store,Amount(JPY)\n2024-05-01,Coffee Shop,350\n").unwrap();
        assert_eq!(
            st.records,
            vec![TransactionRecord::new("2024-05-01", "Coffee Shop", 350.0)]
        );
        assert_eq!(st.records[0].category, None);
        assert_eq!(st.defaulted_amounts, 0);
    }

    #[test]
    fn test_projection_and_order() {
        let text = "\
利用日,利用店名,支払区分,金額,備考
2024/05/01,スーパー,1回,1200,
2024/05/03,電力会社,1回,8400,口座
2024/05/02,書店,1回,abc,
";
        let st = read(text).unwrap();
        assert_eq!(st.records.len(), 3);
        assert_eq!(st.records[0].description, "スーパー");
        assert_eq!(st.records[1].date, "2024/05/03");
        assert_eq!(st.records[1].amount, 8400.0);
        assert_eq!(st.records[2].amount, 0.0);
        assert_eq!(st.defaulted_amounts, 1);
    }

    #[test]
    fn test_short_rows_become_empty_cells() {
        let st = read("Date,Description,Amount\n05/01,Taxi\n").unwrap();
        assert_eq!(st.records.len(), 1);
        assert_eq!(st.records[0].description, "Taxi");
        assert_eq!(st.records[0].amount, 0.0);
        assert_eq!(st.defaulted_amounts, 1);
    }

    #[test]
    fn test_bom_is_stripped() {
        let st = read("\u{feff}Date,Description,Amount\n05/01,Taxi,900\n").unwrap();
        assert_eq!(st.columns.date.header, "Date");
        assert_eq!(st.columns.date.score, 1.0);
    }

    #[test]
    fn test_header_only_gives_empty_statement() {
        let st = read("Date,Description,Amount\n").unwrap();
        assert!(st.records.is_empty());
    }

    #[test]
    fn test_empty_input_is_parse_failure() {
        assert!(matches!(read(""), Err(TallyError::ParseFailure(_))));
    }

    #[test]
    fn test_missing_column_aborts() {
        let err = read("Date,Store,Memo\n05/01,Cafe,hello\n").unwrap_err();
        assert!(matches!(
            err,
            TallyError::ColumnNotFound(CanonicalField::Amount)
        ));
    }

    #[test]
    fn test_invalid_utf8_is_parse_failure() {
        let mut bytes = b"Date,Description,Amount\n05/01,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, 0x00]);
        bytes.extend_from_slice(b",100\n");
        let err = read_statement(bytes.as_slice(), &ColumnResolver::default()).unwrap_err();
        assert!(matches!(err, TallyError::ParseFailure(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement_2024-05.csv");
        std::fs::write(&path, "Date,Store,Amount\n05/01,Cafe,350\n05/02,Bus,220\n").unwrap();

        let st = load_statement(&path, &ColumnResolver::default()).unwrap();
        assert_eq!(st.records.len(), 2);
        assert_eq!(st.records[1].amount, 220.0);
    }

    #[test]
    fn test_missing_file_is_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_statement(dir.path().join("nope.csv"), &ColumnResolver::default())
            .unwrap_err();
        assert!(matches!(err, TallyError::ParseFailure(msg) if msg.contains("nope.csv")));
    }
}
