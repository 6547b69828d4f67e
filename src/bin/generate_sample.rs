use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// (artist, price scale, preferred materials)
const ARTISTS: [(&str, f64, &[&str]); 8] = [
    ("Claude Monet", 9.0, &["oil on canvas", "pastel"]),
    ("Edgar Degas", 6.0, &["pastel", "bronze", "oil on canvas"]),
    ("Auguste Rodin", 5.0, &["bronze", "marble", "plaster"]),
    ("Mary Cassatt", 3.0, &["oil on canvas", "pastel", "etching"]),
    ("Hokusai", 1.5, &["woodblock print", "ink on paper"]),
    ("Barbara Hepworth", 4.0, &["bronze", "wood", "marble"]),
    ("Anonymous", 0.3, &["wood", "ink on paper", "plaster", "etching"]),
    ("Paul Signac", 2.5, &["oil on canvas", "watercolour"]),
];

const COUNTRIES: [&str; 7] = [
    "France", "United States", "United Kingdom", "Japan", "Germany", "Switzerland", "Italy",
];

const COLORS: [&str; 6] = ["red", "blue", "green", "yellow", "brown", "grey"];

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let n_lots: usize = 5000;

    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("auction_cleaned.csv"));
    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("creating {}", output.display()))?;

    writer.write_record([
        "price",
        "artist",
        "material",
        "country",
        "dominantcolor",
        "brightness",
        "height",
        "width",
        "sold_year",
    ])?;

    for _ in 0..n_lots {
        let (artist, scale, materials) = ARTISTS[rng.gen_range(0..ARTISTS.len())];
        let material = materials.choose(&mut rng).copied().unwrap_or("unknown");
        let country = COUNTRIES[rng.gen_range(0..COUNTRIES.len())];
        let color = COLORS[rng.gen_range(0..COLORS.len())];

        let brightness: f64 = rng.gen_range(20.0..235.0);
        let height: f64 = rng.gen_range(10.0..200.0);
        let width: f64 = rng.gen_range(10.0..200.0);

        // Log-normal-ish price: bigger and brighter works fetch a little more.
        let noise: f64 = rng.gen_range(-1.5..1.5);
        let price = (scale * 1_000.0)
            * (noise + (height * width).ln() / 8.0 + brightness / 400.0).exp();

        // One lot in ten has an unknown year (-1), as in cleaned exports.
        let year = if rng.gen_bool(0.1) {
            "-1".to_string()
        } else {
            rng.gen_range(1985..=2024).to_string()
        };

        // Sprinkle in missing dimensions so area derivation has gaps.
        let height = if rng.gen_bool(0.05) { String::new() } else { format!("{height:.1}") };

        writer.write_record([
            format!("{price:.2}"),
            artist.to_string(),
            material.to_string(),
            country.to_string(),
            color.to_string(),
            format!("{brightness:.1}"),
            height,
            format!("{width:.1}"),
            year,
        ])?;
    }

    writer.flush()?;
    println!("Wrote {n_lots} lots to {}", output.display());
    Ok(())
}
