use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use super::filter::ActiveView;
use super::model::Column;
use crate::error::ViewError;

/// Bound the size of a view for dense scatter presentations.
///
/// Returns the whole view when it has at most `max_n` rows; otherwise exactly
/// `max_n` rows drawn uniformly without replacement. The draw depends only on
/// `seed` and the view, so re-renders with unchanged filters show the same
/// points. Picked rows keep their original order.
///
/// A zero budget on a non-empty view selects nothing and so reports
/// [`ViewError::EmptyResult`], the same signal an over-restrictive filter gives.
pub fn sample(view: &ActiveView, max_n: usize, seed: u64) -> Result<ActiveView, ViewError> {
    if view.len() <= max_n {
        return Ok(view.clone());
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, view.len(), max_n).into_vec();
    picked.sort_unstable();

    log::debug!("Sampled {max_n} of {} lots (seed {seed})", view.len());
    let rows = picked.into_iter().map(|i| view.rows()[i].clone()).collect();
    ActiveView::new(rows, view.schema().clone())
}

// ---------------------------------------------------------------------------
// Scatter extraction
// ---------------------------------------------------------------------------

/// One plotted point with its optional colour category and the lot details
/// shown on hover.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub category: Option<String>,
    pub artist: Option<String>,
    pub material: Option<String>,
    pub country: Option<String>,
    pub sold_year: Option<f64>,
}

impl ScatterPoint {
    /// Multi-line hover text; absent details are left out, unknown years
    /// read "unknown".
    pub fn hover_text(&self) -> String {
        let mut lines: Vec<String> = [
            ("Artist", &self.artist),
            ("Material", &self.material),
            ("Country", &self.country),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
        .collect();
        match self.sold_year.filter(|y| *y > 0.0) {
            Some(year) => lines.push(format!("Sold: {year:.0}")),
            None => lines.push("Sold: unknown".to_string()),
        }
        lines.push(format!("Price: {:.0}", self.y));
        lines.join("\n")
    }
}

/// `(x, y)` pairs for rows where both values are present, tagged with
/// `colour_by` when that column exists.
pub fn scatter_points(
    view: &ActiveView,
    x: Column,
    y: Column,
    colour_by: Option<Column>,
) -> Result<Vec<ScatterPoint>, ViewError> {
    view.require(&[x, y])?;
    let colour_by = colour_by.filter(|c| view.has_column(*c));

    Ok(view
        .rows()
        .iter()
        .filter_map(|row| {
            Some(ScatterPoint {
                x: row.numeric(x)?,
                y: row.numeric(y)?,
                category: colour_by
                    .and_then(|c| row.category(c))
                    .map(str::to_string),
                artist: row.artist.clone(),
                material: row.material.clone(),
                country: row.country.clone(),
                sold_year: row.sold_year,
            })
        })
        .collect())
}
