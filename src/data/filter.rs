use std::collections::BTreeSet;

use super::model::{AuctionDataset, AuctionRecord, Column, Schema};
use crate::error::ViewError;

// ---------------------------------------------------------------------------
// Filter selection: what the user picked in the sidebar
// ---------------------------------------------------------------------------

/// The user's current filter choices.
///
/// An empty `artists` / `materials` set means "no restriction" on that
/// dimension, not "match nothing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    /// Inclusive `(lo, hi)` bounds on `sold_year`.
    pub year_range: (i32, i32),
    pub artists: BTreeSet<String>,
    pub materials: BTreeSet<String>,
}

impl FilterSelection {
    /// Full year range, no artist or material restriction.
    pub fn unrestricted(year_range: (i32, i32)) -> Self {
        Self {
            year_range,
            artists: BTreeSet::new(),
            materials: BTreeSet::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActiveView – rows that passed the filters
// ---------------------------------------------------------------------------

/// An owned, non-empty subset of the dataset. Downstream steps (area
/// derivation, sampling) return new views rather than touching this one.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveView {
    rows: Vec<AuctionRecord>,
    schema: Schema,
}

impl ActiveView {
    /// Wrap rows as a view, signalling [`ViewError::EmptyResult`] when there
    /// are none.
    pub fn new(rows: Vec<AuctionRecord>, schema: Schema) -> Result<Self, ViewError> {
        if rows.is_empty() {
            return Err(ViewError::EmptyResult);
        }
        Ok(Self { rows, schema })
    }

    pub fn rows(&self) -> &[AuctionRecord] {
        &self.rows
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.schema.has_column(column)
    }

    /// `Unavailable` naming the first missing column, if any.
    pub fn require(&self, columns: &[Column]) -> Result<(), ViewError> {
        match self.schema.first_missing(columns) {
            Some(column) => Err(ViewError::Unavailable { column }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always `false`: an empty view is never constructed.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fill `column` on every row and add it to the schema.
    pub(crate) fn derive_column(mut self, column: Column, fill: impl FnMut(&mut AuctionRecord)) -> Self {
        self.rows.iter_mut().for_each(fill);
        self.schema.insert(column);
        self
    }
}

// ---------------------------------------------------------------------------
// Row predicates
// ---------------------------------------------------------------------------

/// A single filter dimension evaluated against one row.
pub type RowPredicate<'a> = Box<dyn Fn(&AuctionRecord) -> bool + 'a>;

/// Year filter with the unknown-year pass-through policy: a row whose year is
/// missing or non-positive is always admitted; otherwise it must lie within
/// the inclusive range.
pub fn year_predicate<'a>((lo, hi): (i32, i32)) -> RowPredicate<'a> {
    let (lo, hi) = (f64::from(lo), f64::from(hi));
    Box::new(move |row: &AuctionRecord| match row.valid_year() {
        None => true,
        Some(year) => lo <= year && year <= hi,
    })
}

/// Set-membership filter on a categorical column. `None` when the selection
/// is empty or the column is absent, i.e. the dimension does not restrict.
pub fn membership_predicate<'a>(
    column: Column,
    selected: &'a BTreeSet<String>,
    schema: &Schema,
) -> Option<RowPredicate<'a>> {
    if selected.is_empty() || !schema.has_column(column) {
        return None;
    }
    Some(Box::new(move |row: &AuctionRecord| {
        row.category(column)
            .is_some_and(|value| selected.contains(value))
    }))
}

/// All predicates implied by `selection`, to be combined with logical AND.
pub fn selection_predicates<'a>(
    selection: &'a FilterSelection,
    schema: &Schema,
) -> Vec<RowPredicate<'a>> {
    let mut predicates = vec![year_predicate(selection.year_range)];
    predicates.extend(membership_predicate(Column::Artist, &selection.artists, schema));
    predicates.extend(membership_predicate(
        Column::Material,
        &selection.materials,
        schema,
    ));
    predicates
}

/// Return indices of lots that pass every predicate, in dataset order.
pub fn filtered_indices(dataset: &AuctionDataset, selection: &FilterSelection) -> Vec<usize> {
    let predicates = selection_predicates(selection, &dataset.schema);
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, row)| predicates.iter().all(|keep| keep(*row)))
        .map(|(i, _)| i)
        .collect()
}

/// Build the active view for `selection`. The dataset is never modified; the
/// view owns copies of the surviving rows.
pub fn apply_filters(
    dataset: &AuctionDataset,
    selection: &FilterSelection,
) -> Result<ActiveView, ViewError> {
    let rows: Vec<AuctionRecord> = filtered_indices(dataset, selection)
        .into_iter()
        .map(|i| dataset.records[i].clone())
        .collect();

    log::debug!(
        "Filters {:?} kept {} of {} lots",
        selection.year_range,
        rows.len(),
        dataset.len()
    );
    if rows.is_empty() {
        log::info!("No lots match the current filters");
    }
    ActiveView::new(rows, dataset.schema.clone())
}
