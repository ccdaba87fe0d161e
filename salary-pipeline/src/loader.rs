//! CSV loader: header projection onto the column allow-list, missing-value
//! detection and numeric parsing.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{info, warn};

use crate::errors::LoadError;
use crate::record::{Column, Dataset, MissingReport, Row};

/// Cell values read as missing, matched exactly. Whitespace-only cells are
/// kept as text.
pub const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const PREVIEW_ROWS: usize = 5;
const TITLE_SAMPLE: usize = 20;

/// A loaded dataset with its missing-value report.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub missing: MissingReport,
    /// Header as found in the file, before projection.
    pub source_columns: Vec<String>,
}

/// Loads and projects the salary file at `path`.
///
/// # Errors
/// - [`LoadError::FileNotFound`] if `path` does not exist
/// - [`LoadError::Schema`] if the header has no `job_title`
/// - [`LoadError::Parse`] for non-numeric numeric cells
/// - [`LoadError::Csv`] for malformed records
pub fn load_dataset(path: impl AsRef<Path>) -> Result<LoadedDataset, LoadError> {
    let path = path.as_ref();
    info!("Loading data from {}", path.display());
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let loaded = read_dataset(BufReader::new(file))?;
    info!("Dataset loaded successfully");
    Ok(loaded)
}

/// Parses delimited data with a header row from any reader.
pub fn read_dataset<R: Read>(reader: R) -> Result<LoadedDataset, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let source_columns: Vec<String> = headers.iter().map(str::to_string).collect();

    // column -> index of its first occurrence; iterates in canonical order
    let mut selected: BTreeMap<Column, usize> = BTreeMap::new();
    for (i, h) in headers.iter().enumerate() {
        if let Some(c) = Column::from_header(h) {
            selected.entry(c).or_insert(i);
        }
    }

    if !selected.contains_key(&Column::JobTitle) {
        return Err(LoadError::Schema(Column::JobTitle.name()));
    }

    let mut rows = Vec::new();
    for (row_idx, result) in rdr.records().enumerate() {
        let record = result?;
        let mut row = Row::default();
        for (&col, &i) in &selected {
            set_cell(&mut row, col, record.get(i).unwrap_or(""), row_idx + 1)?;
        }
        rows.push(row);
    }

    let columns: Vec<Column> = selected.keys().copied().collect();
    info!(
        "Original columns: {:?}; shape: ({}, {})",
        source_columns,
        rows.len(),
        source_columns.len()
    );

    let dataset = Dataset::new(rows, columns);
    info!(
        "Selected columns: {:?}; shape after selection: ({}, {})",
        dataset.columns.iter().map(|c| c.name()).collect::<Vec<_>>(),
        dataset.len(),
        dataset.columns.len()
    );
    for (i, row) in dataset.rows.iter().take(PREVIEW_ROWS).enumerate() {
        info!("row {i}: {row:?}");
    }

    let missing = MissingReport::from_dataset(&dataset);
    log_missing(&missing);
    log_titles(&dataset);

    Ok(LoadedDataset {
        dataset,
        missing,
        source_columns,
    })
}

/// `true` for the NA tokens, including the empty cell.
pub fn is_missing_token(raw: &str) -> bool {
    MISSING_TOKENS.contains(&raw)
}

fn set_cell(row: &mut Row, col: Column, raw: &str, row_no: usize) -> Result<(), LoadError> {
    if is_missing_token(raw) {
        return Ok(());
    }
    let bad = || LoadError::Parse {
        row: row_no,
        column: col.name(),
        value: raw.to_string(),
    };
    match col {
        Column::SalaryInUsd => {
            row.salary_in_usd = Some(raw.trim().parse::<f64>().map_err(|_| bad())?);
        }
        Column::RemoteRatio => row.remote_ratio = Some(parse_int(raw).ok_or_else(bad)?),
        Column::WorkYear => row.work_year = Some(parse_int(raw).ok_or_else(bad)?),
        text => {
            if let Some(slot) = row.text_slot(text) {
                *slot = Some(raw.to_string());
            }
        }
    }
    Ok(())
}

/// Integer cell; integral floats such as `50.0` are accepted when they fit
/// in an `i64`.
fn parse_int(raw: &str) -> Option<i64> {
    let t = raw.trim();
    if let Ok(v) = t.parse::<i64>() {
        return Some(v);
    }
    let f = t.parse::<f64>().ok()?;
    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn log_missing(missing: &MissingReport) {
    if missing.is_empty() {
        info!("No missing values found in selected columns");
        return;
    }
    for (col, idx) in &missing.by_column {
        warn!("Missing values in `{}`: {}", col, idx.len());
    }
}

fn log_titles(ds: &Dataset) {
    let unique: BTreeSet<&str> = ds.job_titles().flatten().collect();
    let sample: Vec<&str> = unique.iter().take(TITLE_SAMPLE).copied().collect();
    info!("Unique job titles: {}", unique.len());
    info!("Sample job titles: {:?}", sample);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
work_year,experience_level,employment_type,job_title,salary,salary_currency,salary_in_usd,employee_residence,remote_ratio,company_location,company_size
2025,SE,FT,Data Scientist,150000,USD,150000,US,0,US,M
2025,MI,FT,ML Engineer,120000,EUR,130000.5,DE,100,DE,L
2024,EN,PT,,50000,USD,NA,US,50.0,US,S
";

    #[test]
    fn projects_onto_allow_list_in_canonical_order() {
        let loaded = read_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(loaded.dataset.columns, Column::ALL.to_vec());
        assert_eq!(loaded.source_columns.len(), 11);
        assert_eq!(loaded.dataset.len(), 3);

        let r0 = &loaded.dataset.rows[0];
        assert_eq!(r0.job_title.as_deref(), Some("Data Scientist"));
        assert_eq!(r0.salary_in_usd, Some(150000.0));
        assert_eq!(r0.work_year, Some(2025));
        assert_eq!(r0.company_size.as_deref(), Some("M"));

        assert_eq!(loaded.dataset.rows[1].salary_in_usd, Some(130000.5));
        assert_eq!(loaded.dataset.rows[2].remote_ratio, Some(50));
    }

    #[test]
    fn missing_cells_become_none_and_are_reported() {
        let loaded = read_dataset(SAMPLE.as_bytes()).unwrap();
        let r2 = &loaded.dataset.rows[2];
        assert!(r2.job_title.is_none());
        assert!(r2.salary_in_usd.is_none());
        assert_eq!(loaded.missing.by_column.get(&Column::JobTitle), Some(&vec![2]));
        assert_eq!(loaded.missing.count(Column::SalaryInUsd), 1);
        assert_eq!(loaded.missing.total(), 2);
    }

    #[test]
    fn absent_allow_list_columns_are_omitted() {
        let data = "job_title,salary_in_usd,bonus\nAnalyst,90000,5\n";
        let loaded = read_dataset(data.as_bytes()).unwrap();
        assert_eq!(
            loaded.dataset.columns,
            vec![Column::JobTitle, Column::SalaryInUsd]
        );
        assert!(loaded.missing.is_empty());
    }

    #[test]
    fn missing_job_title_column_is_a_schema_error() {
        let data = "salary_in_usd,work_year\n1,2025\n";
        let err = read_dataset(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Schema("job_title")));
    }

    #[test]
    fn non_numeric_numeric_cell_is_a_parse_error() {
        let data = "job_title,work_year\nAnalyst,2025\nAnalyst,soon\n";
        match read_dataset(data.as_bytes()).unwrap_err() {
            LoadError::Parse { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "work_year");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ragged_record_is_a_csv_error() {
        let data = "job_title,work_year\nAnalyst,2025,extra\n";
        assert!(matches!(
            read_dataset(data.as_bytes()).unwrap_err(),
            LoadError::Csv(_)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        assert!(matches!(
            load_dataset(&path).unwrap_err(),
            LoadError::FileNotFound(p) if p == path
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        let loaded = load_dataset(f.path()).unwrap();
        assert_eq!(loaded.dataset.len(), 3);
    }

    #[test]
    fn na_tokens() {
        for t in MISSING_TOKENS {
            assert!(is_missing_token(t), "{t:?}");
        }
        for t in ["  ", " NA ", "N/A Engineer", "na", "0"] {
            assert!(!is_missing_token(t), "{t:?}");
        }
    }

    #[test]
    fn every_na_token_is_missing_in_text_and_numeric_columns() {
        for t in MISSING_TOKENS {
            let csv = format!("job_title,salary_in_usd,work_year\n\"{t}\",\"{t}\",\"{t}\"\n");
            let loaded = read_dataset(csv.as_bytes()).unwrap_or_else(|e| panic!("{t:?}: {e}"));
            let row = &loaded.dataset.rows[0];
            assert_eq!(row.job_title, None, "{t:?}");
            assert_eq!(row.salary_in_usd, None, "{t:?}");
            assert_eq!(row.work_year, None, "{t:?}");
            assert_eq!(loaded.missing.count(Column::JobTitle), 1, "{t:?}");
        }
    }

    #[test]
    fn whitespace_title_is_kept_as_text() {
        let loaded = read_dataset("job_title,salary_in_usd\n\" \",100\n".as_bytes()).unwrap();
        assert_eq!(loaded.dataset.rows[0].job_title.as_deref(), Some(" "));
        assert!(loaded.missing.is_empty());
    }

    #[test]
    fn out_of_range_integer_is_a_parse_error() {
        let err = read_dataset("job_title,work_year\nAnalyst,1e30\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse { row: 1, column: "work_year", .. }
        ));
        let loaded = read_dataset("job_title,work_year\nAnalyst,2024.0\n".as_bytes()).unwrap();
        assert_eq!(loaded.dataset.rows[0].work_year, Some(2024));
    }

    #[test]
    fn duplicate_header_uses_first_occurrence() {
        let loaded = read_dataset("job_title,job_title\nFirst,Second\n".as_bytes()).unwrap();
        assert_eq!(loaded.dataset.columns, vec![Column::JobTitle]);
        assert_eq!(loaded.dataset.rows[0].job_title.as_deref(), Some("First"));
    }
}
