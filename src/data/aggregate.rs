//! Group-by / aggregate / sort / limit transformations feeding the charts.
//!
//! Every ranking is sorted by its measure, descending, with a stable sort so
//! that ties keep the order in which their groups first appear in the view.
//! Null group keys are dropped.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::filter::ActiveView;
use super::model::{AuctionRecord, Column};
use crate::error::ViewError;

// ---------------------------------------------------------------------------
// Request and result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
}

/// One aggregation shape plus its parameters. Group columns must be
/// categorical; measure columns numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationSpec {
    /// Sum or mean of `measure` per `group`, top `top_n`.
    Ranked {
        group: Column,
        measure: Column,
        reducer: Reducer,
        top_n: usize,
    },
    /// Top `top_n` group sums, each with its share of the top-N total.
    Share {
        group: Column,
        measure: Column,
        top_n: usize,
    },
    /// Mean `measure` per (`rows`, `columns`) cell over the most frequent
    /// `top_rows` / `top_columns` values.
    CrossTab {
        rows: Column,
        columns: Column,
        measure: Column,
        top_rows: usize,
        top_columns: usize,
    },
}

impl AggregationSpec {
    /// Sum of `price` per `group`.
    pub fn total_price(group: Column, top_n: usize) -> Self {
        AggregationSpec::Ranked {
            group,
            measure: Column::Price,
            reducer: Reducer::Sum,
            top_n,
        }
    }

    /// Mean of `price` per `group`.
    pub fn average_price(group: Column, top_n: usize) -> Self {
        AggregationSpec::Ranked {
            group,
            measure: Column::Price,
            reducer: Reducer::Mean,
            top_n,
        }
    }

    /// Columns that must be in the view's schema for this request.
    pub fn required_columns(&self) -> Vec<Column> {
        match *self {
            AggregationSpec::Ranked { group, measure, .. }
            | AggregationSpec::Share { group, measure, .. } => vec![group, measure],
            AggregationSpec::CrossTab {
                rows,
                columns,
                measure,
                ..
            } => vec![rows, columns, measure],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub key: String,
    pub value: f64,
    /// Only set by share-of-total requests.
    pub share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTable {
    pub group: Column,
    pub measure: Column,
    pub reducer: Reducer,
    pub rows: Vec<RankedRow>,
}

/// Cross-tabulation; `cells[r][c]` is `None` where no observation exists.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_column: Column,
    pub col_column: Column,
    pub row_keys: Vec<String>,
    pub col_keys: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn cell(&self, row_key: &str, col_key: &str) -> Option<f64> {
        let r = self.row_keys.iter().position(|k| k == row_key)?;
        let c = self.col_keys.iter().position(|k| k == col_key)?;
        self.cells[r][c]
    }

    /// Smallest and largest defined cell, for colour scaling.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Ranked(RankedTable),
    Pivot(PivotTable),
}

/// Run one aggregation request. Missing columns yield
/// [`ViewError::Unavailable`] and nothing is computed.
pub fn aggregate(view: &ActiveView, spec: &AggregationSpec) -> Result<Aggregation, ViewError> {
    view.require(&spec.required_columns())?;
    Ok(match *spec {
        AggregationSpec::Ranked {
            group,
            measure,
            reducer,
            top_n,
        } => Aggregation::Ranked(top_groups(view.rows(), group, measure, reducer, top_n)),
        AggregationSpec::Share {
            group,
            measure,
            top_n,
        } => Aggregation::Ranked(share_of_total(view.rows(), group, measure, top_n)),
        AggregationSpec::CrossTab {
            rows,
            columns,
            measure,
            top_rows,
            top_columns,
        } => Aggregation::Pivot(cross_tab(
            view.rows(),
            rows,
            columns,
            measure,
            top_rows,
            top_columns,
        )),
    })
}

// ---------------------------------------------------------------------------
// Group-sum / group-mean
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Acc {
    sum: f64,
    n: usize,
}

/// Reduce `measure` per group, in order of first appearance. Missing measures
/// are skipped; a group with none at all sums to 0 and has no mean (dropped).
pub fn group_by(
    rows: &[AuctionRecord],
    group: Column,
    measure: Column,
    reducer: Reducer,
) -> Vec<RankedRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Acc)> = Vec::new();

    for row in rows {
        let Some(key) = row.category(group) else {
            continue;
        };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, Acc::default()));
            groups.len() - 1
        });
        if let Some(v) = row.numeric(measure) {
            let acc = &mut groups[slot].1;
            acc.sum += v;
            acc.n += 1;
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, acc)| {
            let value = match reducer {
                Reducer::Sum => acc.sum,
                Reducer::Mean if acc.n == 0 => return None,
                Reducer::Mean => acc.sum / acc.n as f64,
            };
            Some(RankedRow {
                key: key.to_string(),
                value,
                share: None,
            })
        })
        .collect()
}

/// Sort descending by value (stable) and keep the first `top_n`.
pub fn rank(mut rows: Vec<RankedRow>, top_n: usize) -> Vec<RankedRow> {
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows.truncate(top_n);
    rows
}

pub fn top_groups(
    rows: &[AuctionRecord],
    group: Column,
    measure: Column,
    reducer: Reducer,
    top_n: usize,
) -> RankedTable {
    RankedTable {
        group,
        measure,
        reducer,
        rows: rank(group_by(rows, group, measure, reducer), top_n),
    }
}

// ---------------------------------------------------------------------------
// Share-of-total
// ---------------------------------------------------------------------------

/// Top-N group sums with `share = value / sum(top-N values)`, so shares add up
/// to 1 over the returned rows. Shares stay `None` if that total is zero.
pub fn share_of_total(
    rows: &[AuctionRecord],
    group: Column,
    measure: Column,
    top_n: usize,
) -> RankedTable {
    let mut table = top_groups(rows, group, measure, Reducer::Sum, top_n);
    let total: f64 = table.rows.iter().map(|r| r.value).sum();
    if total != 0.0 {
        for row in &mut table.rows {
            row.share = Some(row.value / total);
        }
    }
    table
}

// ---------------------------------------------------------------------------
// Categorical frequency and cross-tabulation
// ---------------------------------------------------------------------------

/// Row count per distinct non-null value, most frequent first; ties keep
/// first-appearance order.
pub fn value_counts(rows: &[AuctionRecord], column: Column) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in rows.iter().filter_map(|r| r.category(column)) {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(value, n)| (value.to_string(), n))
        .collect()
}

fn most_frequent(rows: &[AuctionRecord], column: Column, k: usize) -> BTreeSet<String> {
    value_counts(rows, column)
        .into_iter()
        .take(k)
        .map(|(value, _)| value)
        .collect()
}

/// Mean `measure` per (`row_col`, `col_col`) cell, restricted to rows whose
/// values are among the `top_rows` / `top_cols` most frequent in `rows`.
/// Keys are ordered ascending; cells without observations are `None`.
pub fn cross_tab(
    rows: &[AuctionRecord],
    row_col: Column,
    col_col: Column,
    measure: Column,
    top_rows: usize,
    top_cols: usize,
) -> PivotTable {
    let keep_rows = most_frequent(rows, row_col, top_rows);
    let keep_cols = most_frequent(rows, col_col, top_cols);

    let mut cells: BTreeMap<(&str, &str), Acc> = BTreeMap::new();
    for row in rows {
        let (Some(r), Some(c), Some(v)) = (
            row.category(row_col),
            row.category(col_col),
            row.numeric(measure),
        ) else {
            continue;
        };
        if keep_rows.contains(r) && keep_cols.contains(c) {
            let acc = cells.entry((r, c)).or_default();
            acc.sum += v;
            acc.n += 1;
        }
    }

    let row_keys: Vec<String> = cells
        .keys()
        .map(|(r, _)| *r)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let col_keys: Vec<String> = cells
        .keys()
        .map(|(_, c)| *c)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let grid = row_keys
        .iter()
        .map(|r| {
            col_keys
                .iter()
                .map(|c| {
                    cells
                        .get(&(r.as_str(), c.as_str()))
                        .map(|acc| acc.sum / acc.n as f64)
                })
                .collect()
        })
        .collect();

    PivotTable {
        row_column: row_col,
        col_column: col_col,
        row_keys,
        col_keys,
        cells: grid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Schema;

    fn lot(price: Option<f64>, material: Option<&str>, country: Option<&str>) -> AuctionRecord {
        AuctionRecord {
            price,
            material: material.map(str::to_string),
            country: country.map(str::to_string),
            ..Default::default()
        }
    }

    fn materials() -> Vec<AuctionRecord> {
        vec![
            lot(Some(50.0), Some("wood"), None),
            lot(Some(50.0), Some("wood"), None),
            lot(Some(30.0), Some("bronze"), None),
            lot(Some(10.0), Some("marble"), None),
        ]
    }

    fn keys(table: &RankedTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn group_sum_top_two() {
        let t = top_groups(&materials(), Column::Material, Column::Price, Reducer::Sum, 2);
        assert_eq!(keys(&t), vec!["wood", "bronze"]);
        assert_eq!(t.rows[0].value, 100.0);
        assert_eq!(t.rows[1].value, 30.0);
        assert!(t.rows.iter().all(|r| r.share.is_none()));
    }

    #[test]
    fn share_is_relative_to_top_n() {
        let t = share_of_total(&materials(), Column::Material, Column::Price, 2);
        let shares: Vec<f64> = t.rows.iter().filter_map(|r| r.share).collect();
        assert!((shares[0] - 100.0 / 130.0).abs() < 1e-12);
        assert!((shares[1] - 30.0 / 130.0).abs() < 1e-12);
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_total_leaves_share_unset() {
        let rows = vec![lot(Some(0.0), Some("wood"), None)];
        let t = share_of_total(&rows, Column::Material, Column::Price, 5);
        assert_eq!(t.rows[0].share, None);
    }

    #[test]
    fn group_mean_skips_missing_measure() {
        let rows = vec![
            lot(Some(10.0), Some("oil"), None),
            lot(None, Some("oil"), None),
            lot(Some(30.0), Some("oil"), None),
            lot(None, Some("ink"), None),
            lot(Some(99.0), None, None),
        ];
        let t = top_groups(&rows, Column::Material, Column::Price, Reducer::Mean, 10);
        assert_eq!(keys(&t), vec!["oil"]);
        assert_eq!(t.rows[0].value, 20.0);

        let sums = top_groups(&rows, Column::Material, Column::Price, Reducer::Sum, 10);
        assert_eq!(keys(&sums), vec!["oil", "ink"]);
        assert_eq!(sums.rows[1].value, 0.0);
    }

    #[test]
    fn ties_keep_first_appearance() {
        let rows = vec![
            lot(Some(5.0), Some("c"), None),
            lot(Some(5.0), Some("a"), None),
            lot(Some(9.0), Some("b"), None),
            lot(Some(5.0), Some("d"), None),
        ];
        let t = top_groups(&rows, Column::Material, Column::Price, Reducer::Sum, 3);
        assert_eq!(keys(&t), vec!["b", "c", "a"]);
    }

    #[test]
    fn value_counts_orders_by_frequency() {
        let rows = vec![
            lot(None, Some("ink"), None),
            lot(None, Some("oil"), None),
            lot(None, Some("oil"), None),
            lot(None, None, None),
            lot(None, Some("clay"), None),
        ];
        assert_eq!(
            value_counts(&rows, Column::Material),
            vec![("oil".to_string(), 2), ("ink".to_string(), 1), ("clay".to_string(), 1)]
        );
    }

    #[test]
    fn cross_tab_restricts_to_frequent_values() {
        let rows = vec![
            lot(Some(10.0), Some("oil"), Some("FR")),
            lot(Some(30.0), Some("oil"), Some("FR")),
            lot(Some(5.0), Some("ink"), Some("FR")),
            lot(Some(7.0), Some("oil"), Some("US")),
            lot(Some(1.0), Some("oil"), Some("US")),
            lot(Some(1000.0), Some("clay"), Some("JP")),
        ];
        // Frequency is counted in rows, not in price: JP and clay are rare.
        let p = cross_tab(&rows, Column::Country, Column::Material, Column::Price, 2, 2);
        assert_eq!(p.row_keys, vec!["FR", "US"]);
        assert_eq!(p.col_keys, vec!["ink", "oil"]);
        assert_eq!(p.cell("FR", "oil"), Some(20.0));
        assert_eq!(p.cell("FR", "ink"), Some(5.0));
        assert_eq!(p.cell("US", "oil"), Some(4.0));
        assert_eq!(p.cell("US", "ink"), None);
        assert_eq!(p.cell("JP", "clay"), None);
        assert_eq!(p.value_range(), Some((4.0, 20.0)));
    }

    #[test]
    fn missing_group_column_is_unavailable() {
        let view = ActiveView::new(materials(), Schema::new([Column::Price, Column::Material])).unwrap();
        let spec = AggregationSpec::total_price(Column::Artist, 10);
        assert_eq!(
            aggregate(&view, &spec),
            Err(ViewError::Unavailable { column: Column::Artist })
        );

        let ok = aggregate(&view, &AggregationSpec::average_price(Column::Material, 1)).unwrap();
        match ok {
            Aggregation::Ranked(t) => {
                assert_eq!(t.rows.len(), 1);
                assert_eq!(t.rows[0].key, "wood");
                assert_eq!(t.rows[0].value, 50.0);
            }
            Aggregation::Pivot(_) => panic!("expected a ranked table"),
        }
    }
}
