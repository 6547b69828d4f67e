#![allow(dead_code)]

//! Shared fixtures for the integration tests.
//!
//! Provides `write_csv()` which drops a CSV into a fresh temp directory and
//! `open_dashboard()` which loads it through the normal candidate lookup.

use std::io::Write;
use std::path::PathBuf;

use auction_lens::{Dashboard, DashboardConfig};

/// Write `contents` to `<tmp>/name`. Keep the `TempDir` alive for the test.
pub fn write_csv(name: &str, contents: &str) -> (PathBuf, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    (path, dir)
}

/// Dashboard over a CSV fixture, found via a missing first candidate.
pub fn open_dashboard(contents: &str) -> (Dashboard, tempfile::TempDir) {
    let (path, dir) = write_csv("auction_cleaned.csv", contents);
    let config = DashboardConfig {
        candidates: vec![dir.path().join("data/processed/auction_cleaned.csv"), path],
        ..DashboardConfig::default()
    };
    (Dashboard::open(config).unwrap(), dir)
}

/// A small mixed dataset: sentinel years, blank cells, repeated groups.
pub const LOTS: &str = "\
price,artist,material,country,dominantcolor,brightness,height,width,sold_year
100,Monet,oil,France,blue,120,10,20,1990
250,Monet,oil,France,green,80,,30,2001
40,Degas,bronze,France,red,200,5,5,-1
900,Rodin,marble,Italy,grey,150,100,40,2015
60,Degas,pastel,United States,red,90,8,12,
75, Rodin ,bronze,Italy,grey,60,20,20,1995
abc,Hokusai,ink,Japan,blue,30,30,40,2010
";
