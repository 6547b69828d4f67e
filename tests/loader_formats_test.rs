mod common;

use std::sync::Arc;

use anyhow::Result;
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use auction_lens::data::loader::{load_file, DatasetLoader};
use auction_lens::{Column, LoadError, YearDomain};
use parquet::arrow::ArrowWriter;

#[test]
fn parquet_source_is_normalised() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("auction_cleaned.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("price", DataType::Float64, true),
        Field::new("artist", DataType::Utf8, true),
        Field::new("country", DataType::Utf8, true),
        Field::new("sold_year", DataType::Int64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(vec![Some(1200.0), None, Some(80.5)])),
            Arc::new(StringArray::from(vec![Some(" Monet "), Some("Degas"), None])),
            Arc::new(StringArray::from(vec![Some("France"), Some("France"), Some("Japan")])),
            Arc::new(Int64Array::from(vec![Some(2003), Some(-1), None])),
        ],
    )?;
    let file = std::fs::File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    let ds = load_file(&path, YearDomain::FALLBACK)?;
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.records[0].artist.as_deref(), Some("Monet"));
    assert_eq!(ds.records[1].price, None);
    assert_eq!(ds.records[2].artist, None);
    assert_eq!(ds.records[1].sold_year, Some(-1.0));
    assert_eq!(ds.year_domain.as_tuple(), (2003, 2003));
    assert!(ds.schema.has_column(Column::Country));
    assert!(!ds.schema.has_column(Column::Material));
    Ok(())
}

#[test]
fn json_source_with_timestamps() -> Result<()> {
    let (path, _dir) = common::write_csv(
        "lots.json",
        r#"[{"price": 10, "soldtime": "2004-06-01T10:00:00"},
            {"price": 20, "soldtime": "not a date"},
            {"price": 30}]"#,
    );
    let ds = load_file(&path, YearDomain::FALLBACK)?;
    let years: Vec<_> = ds.records.iter().map(|r| r.sold_year).collect();
    assert_eq!(years, vec![Some(2004.0), None, None]);
    Ok(())
}

#[test]
fn no_candidates_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let loader = DatasetLoader::new(
        vec![
            dir.path().join("data/processed/auction_cleaned.csv"),
            dir.path().join("auction_cleaned.csv"),
        ],
        YearDomain::FALLBACK,
    );
    let err = loader.load().unwrap_err();
    assert!(matches!(err, LoadError::NotFound { ref candidates } if candidates.len() == 2));
    assert!(err.to_string().contains("auction_cleaned.csv"));
}

#[test]
fn corrupt_parquet_error_names_the_file() {
    let (path, _dir) = common::write_csv("broken.parquet", "this is not parquet");
    let err = load_file(&path, YearDomain::FALLBACK).unwrap_err();

    assert!(matches!(err, LoadError::Read { .. }));
    assert!(err.to_string().contains("broken.parquet"));
    let chain = format!("{:#}", anyhow::Error::new(err));
    assert!(chain.contains("reading Parquet metadata"));
}
