use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use arrow::array::{Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use anyhow::Context;
use arrow::util::display::array_value_to_string;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{AuctionDataset, AuctionRecord, CellValue, Column, Schema, YearDomain};
use crate::error::{LoadError, Result};

// ---------------------------------------------------------------------------
// Load-once dataset service
// ---------------------------------------------------------------------------

/// Owns the ordered candidate list and the process-lifetime cache.
///
/// The first successful [`DatasetLoader::load`] reads the source; every later
/// call hands back the same `Arc` without touching the filesystem.
#[derive(Debug)]
pub struct DatasetLoader {
    candidates: Vec<PathBuf>,
    fallback: YearDomain,
    cache: OnceLock<Arc<AuctionDataset>>,
}

impl DatasetLoader {
    pub fn new(candidates: Vec<PathBuf>, fallback: YearDomain) -> Self {
        Self {
            candidates,
            fallback,
            cache: OnceLock::new(),
        }
    }

    pub fn load(&self) -> Result<Arc<AuctionDataset>> {
        if let Some(ds) = self.cache.get() {
            log::debug!("Dataset cache hit ({} lots)", ds.len());
            return Ok(Arc::clone(ds));
        }
        let path = resolve_source(&self.candidates)?;
        let dataset = Arc::new(load_file(path, self.fallback)?);
        log::info!(
            "Loaded {} lots from {} (years {}..={})",
            dataset.len(),
            path.display(),
            dataset.year_domain.min,
            dataset.year_domain.max
        );
        // A concurrent first load keeps whichever instance landed first.
        Ok(Arc::clone(self.cache.get_or_init(|| dataset)))
    }
}

/// First candidate that exists on disk.
pub fn resolve_source(candidates: &[PathBuf]) -> Result<&Path> {
    for path in candidates {
        if path.exists() {
            log::info!("Using auction data at {}", path.display());
            return Ok(path);
        }
        log::debug!("Candidate {} does not exist", path.display());
    }
    Err(LoadError::NotFound {
        candidates: candidates.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and normalise an auction dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one lot per line
/// * `.json`    – `[{ "price": 1200.0, "artist": "...", ... }, ...]`
/// * `.parquet` – flat columns written by Pandas or Polars
pub fn load_file(path: &Path, fallback: YearDomain) -> Result<AuctionDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let read = match ext.as_str() {
        "csv" => read_csv(path),
        "json" => read_json(path),
        "parquet" | "pq" => read_parquet(path),
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };
    let table = read.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    normalize(table, path, fallback)
}

// ---------------------------------------------------------------------------
// Raw table shared by all readers
// ---------------------------------------------------------------------------

/// Column-named cells exactly as read, before any coercion.
#[derive(Debug, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Turn raw cells into typed records.
///
/// * `sold_year` is coerced to a number (bad values become null); if absent it
///   is derived from `soldtime`, and failing that every row gets null.
/// * Categorical columns are forced to text and trimmed.
/// * Columns the source does not carry are left out of the schema.
pub fn normalize(table: RawTable, source: &Path, fallback: YearDomain) -> Result<AuctionDataset> {
    let mut positions: BTreeMap<Column, usize> = BTreeMap::new();
    for (i, header) in table.headers.iter().enumerate() {
        match Column::from_name(header.trim()) {
            Some(c) => {
                positions.entry(c).or_insert(i);
            }
            None => log::debug!("Ignoring unknown column '{header}'"),
        }
    }

    if !positions.contains_key(&Column::Price) {
        return Err(LoadError::Malformed(format!(
            "{} has no 'price' column",
            source.display()
        )));
    }

    let mut schema = Schema::new(positions.keys().copied());
    schema.insert(Column::SoldYear);

    let year_source = if positions.contains_key(&Column::SoldYear) {
        Some(Column::SoldYear)
    } else if positions.contains_key(&Column::SoldTime) {
        log::info!("No 'sold_year' column; deriving it from 'soldtime'");
        Some(Column::SoldTime)
    } else {
        log::warn!("Neither 'sold_year' nor 'soldtime' present; all years unknown");
        None
    };

    let mut coerced: BTreeMap<Column, usize> = BTreeMap::new();
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let cell = |c: Column| cell_at(row, &positions, c);
        let mut numeric = |c: Column| -> Option<f64> {
            let raw = cell(c);
            let value = raw.as_f64();
            if value.is_none() && *raw != CellValue::Null {
                *coerced.entry(c).or_default() += 1;
            }
            value
        };

        let sold_year = match year_source {
            Some(Column::SoldYear) => numeric(Column::SoldYear),
            Some(_) => soldtime_year(cell(Column::SoldTime)).map(f64::from),
            None => None,
        };

        records.push(AuctionRecord {
            price: numeric(Column::Price),
            artist: cell(Column::Artist).as_trimmed_text(),
            material: cell(Column::Material).as_trimmed_text(),
            country: cell(Column::Country).as_trimmed_text(),
            dominantcolor: cell(Column::DominantColor).as_trimmed_text(),
            brightness: numeric(Column::Brightness),
            height: numeric(Column::Height),
            width: numeric(Column::Width),
            area: numeric(Column::Area),
            sold_year,
        });
    }

    for (column, n) in &coerced {
        log::debug!("Coerced {n} malformed '{column}' values to null");
    }

    Ok(AuctionDataset::new(
        records,
        schema,
        source.to_path_buf(),
        fallback,
    ))
}

static NULL_CELL: CellValue = CellValue::Null;

fn cell_at<'a>(row: &'a [CellValue], positions: &BTreeMap<Column, usize>, c: Column) -> &'a CellValue {
    positions
        .get(&c)
        .and_then(|&i| row.get(i))
        .unwrap_or(&NULL_CELL)
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Year of a `soldtime` cell. Integers are epoch milliseconds, which is how
/// `DataFrame.to_json` writes datetimes.
fn soldtime_year(cell: &CellValue) -> Option<i32> {
    match cell {
        CellValue::Integer(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.year()),
        other => other.as_trimmed_text().and_then(|s| parse_timestamp_year(&s)),
    }
}

/// Year of a timestamp-like string, `None` if it cannot be parsed.
pub fn parse_timestamp_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.year());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.year());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.year())
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Header row with column names, one lot per record. Empty cells are null.
fn read_csv(path: &Path) -> anyhow::Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Row {i} of CSV"))?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Headers are the
/// union of keys in first-seen order.
fn read_json(path: &Path) -> anyhow::Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Flat Parquet table; works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> anyhow::Result<RawTable> {
    let file = std::fs::File::open(path).context("opening Parquet file")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading Parquet metadata")?
        .build()
        .context("building Parquet reader")?;

    let mut table = RawTable::default();

    for (n, batch_result) in reader.enumerate() {
        let batch = batch_result.with_context(|| format!("decoding record batch {n}"))?;
        if table.headers.is_empty() {
            table.headers = batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect();
        }

        for row in 0..batch.num_rows() {
            table.rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col.as_ref(), row))
                    .collect(),
            );
        }
    }

    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &dyn Array, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let typed = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| CellValue::Text(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| CellValue::Text(s.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(i64::from(a.value(row)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(f64::from(a.value(row)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };
    // Dates, timestamps, dictionaries etc. go through Arrow's display form.
    typed.unwrap_or_else(|| match array_value_to_string(col, row) {
        Ok(s) => CellValue::Text(s),
        Err(e) => {
            log::debug!("Unreadable {:?} cell at row {row}: {e}", col.data_type());
            CellValue::Null
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_normalises_years_and_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "lots.csv",
            "price,artist,material,sold_year\n\
             100, Monet ,oil,1990\n\
             200,Degas,  bronze ,-1\n\
             300,Monet,oil,unknown\n",
        );

        let ds = load_file(&path, YearDomain::FALLBACK).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records[0].artist.as_deref(), Some("Monet"));
        assert_eq!(ds.records[1].material.as_deref(), Some("bronze"));
        assert_eq!(ds.records[1].sold_year, Some(-1.0));
        assert_eq!(ds.records[2].sold_year, None);
        assert_eq!(ds.year_domain.as_tuple(), (1990, 1990));
        assert!(ds.schema.has_column(Column::Artist));
        assert!(!ds.schema.has_column(Column::Country));
    }

    #[test]
    fn sold_year_derived_from_soldtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "lots.csv",
            "price,soldtime\n10,2001-05-03 10:00:00\n20,garbage\n30,2019-11-30\n",
        );

        let ds = load_file(&path, YearDomain::FALLBACK).unwrap();
        let years: Vec<_> = ds.records.iter().map(|r| r.sold_year).collect();
        assert_eq!(years, vec![Some(2001.0), None, Some(2019.0)]);
        assert!(ds.schema.has_column(Column::SoldYear));
        assert_eq!(ds.year_domain.as_tuple(), (2001, 2019));
    }

    #[test]
    fn missing_year_columns_leave_all_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "lots.csv", "price\n1\n2\n");

        let ds = load_file(&path, YearDomain { min: 1900, max: 1950 }).unwrap();
        assert!(ds.records.iter().all(|r| r.sold_year.is_none()));
        assert_eq!(ds.year_domain.as_tuple(), (1900, 1950));
    }

    #[test]
    fn json_records_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "lots.json",
            r#"[{"price": 5, "country": " France", "sold_year": 2004.0},
                {"price": "n/a", "height": 2, "width": 3}]"#,
        );

        let ds = load_file(&path, YearDomain::FALLBACK).unwrap();
        assert_eq!(ds.records[0].country.as_deref(), Some("France"));
        assert_eq!(ds.records[1].price, None);
        assert_eq!(ds.records[1].height, Some(2.0));
        assert!(ds.schema.has_column(Column::Width));
    }

    #[test]
    fn epoch_millis_soldtime_gives_year() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "lots.json",
            r#"[{"price": 10, "soldtime": 1086084000000},
                {"price": 20, "soldtime": "2011-02-03"}]"#,
        );

        let ds = load_file(&path, YearDomain::FALLBACK).unwrap();
        let years: Vec<_> = ds.records.iter().map(|r| r.sold_year).collect();
        assert_eq!(years, vec![Some(2004.0), Some(2011.0)]);
    }

    #[test]
    fn duplicate_and_unknown_headers_use_first_known() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "lots.csv", "lot_id,price,price
7,1,2
");

        let ds = load_file(&path, YearDomain::FALLBACK).unwrap();
        assert_eq!(ds.records[0].price, Some(1.0));
    }

    #[test]
    fn json_shape_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "lots.json", r#"{"price": 1}"#);

        let err = load_file(&path, YearDomain::FALLBACK).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
        assert!(err.to_string().contains("lots.json"));
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.contains("Expected top-level JSON array"));
    }

    #[test]
    fn price_column_is_required() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "lots.csv", "artist\nMonet\n");
        let err = load_file(&path, YearDomain::FALLBACK).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("lots.xlsx"), YearDomain::FALLBACK).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let second = write_file(dir.path(), "b.csv", "price\n1\n");
        let third = write_file(dir.path(), "c.csv", "price\n2\n");
        let candidates = vec![dir.path().join("a.csv"), second.clone(), third];
        assert_eq!(resolve_source(&candidates).unwrap(), second.as_path());
    }

    #[test]
    fn no_candidate_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DatasetLoader::new(vec![dir.path().join("missing.csv")], YearDomain::FALLBACK);
        let err = loader.load().unwrap_err();
        assert!(matches!(err, LoadError::NotFound { candidates } if candidates.len() == 1));
    }

    #[test]
    fn loader_caches_first_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "lots.csv", "price\n1\n");
        let loader = DatasetLoader::new(vec![path.clone()], YearDomain::FALLBACK);

        let first = loader.load().unwrap();
        std::fs::remove_file(&path).unwrap();
        let second = loader.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn timestamp_formats() {
        assert_eq!(parse_timestamp_year("2020-02-01T12:00:00+01:00"), Some(2020));
        assert_eq!(parse_timestamp_year("2018-07-04T08:30:00"), Some(2018));
        assert_eq!(parse_timestamp_year("12/31/1999"), Some(1999));
        assert_eq!(parse_timestamp_year("yesterday"), None);
    }
}
