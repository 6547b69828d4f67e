use super::filter::ActiveView;

/// Headline figures over the `price` column of an active view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    /// Sum of known prices.
    pub total: f64,
    /// Number of lots in the view, priced or not.
    pub count: usize,
    /// `None` when no lot in the view has a price.
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Reduce a view to its KPIs. Missing prices are skipped by every measure
/// except `count`.
pub fn summarize(view: &ActiveView) -> Kpis {
    let mut prices: Vec<f64> = view.rows().iter().filter_map(|r| r.price).collect();
    let total: f64 = prices.iter().sum();
    let mean = (!prices.is_empty()).then(|| total / prices.len() as f64);

    Kpis {
        total,
        count: view.len(),
        mean,
        median: median(&mut prices),
    }
}

/// Median of `values`, averaging the two middle elements for even lengths.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
