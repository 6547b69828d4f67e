use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::aggregate::{self, Aggregation, AggregationSpec};
use crate::data::filter::{self, ActiveView, FilterSelection};
use crate::data::loader::DatasetLoader;
use crate::data::model::{AuctionDataset, Column};
use crate::data::sample;
use crate::data::summary::{self, Kpis};
use crate::error::{Result, ViewError};

// ---------------------------------------------------------------------------
// Dashboard – the service handed to the presentation layer
// ---------------------------------------------------------------------------

/// Read-only access to the loaded dataset plus every operation the
/// presentation layer needs. Cheap to clone; clones share the dataset, and
/// each session keeps its own [`FilterSelection`] and views.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Arc<AuctionDataset>,
    config: DashboardConfig,
}

impl Dashboard {
    /// Load the dataset from the configured candidates.
    ///
    /// Each call reads the source; the returned `Dashboard` is the load-once
    /// handle and its clones share that single read. Dashboards that must
    /// share one read without cloning go through [`Dashboard::from_loader`].
    pub fn open(config: DashboardConfig) -> Result<Self> {
        let loader = DatasetLoader::new(config.candidates.clone(), config.fallback_domain());
        Self::from_loader(&loader, config)
    }

    pub fn from_loader(loader: &DatasetLoader, config: DashboardConfig) -> Result<Self> {
        Ok(Self::from_dataset(loader.load()?, config))
    }

    pub fn from_dataset(dataset: Arc<AuctionDataset>, config: DashboardConfig) -> Self {
        Self { dataset, config }
    }

    pub fn dataset(&self) -> &AuctionDataset {
        &self.dataset
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn year_domain(&self) -> (i32, i32) {
        self.dataset.year_domain.as_tuple()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.dataset.schema.has_column(column)
    }

    /// Most frequent artists across the whole dataset, for the artist picker.
    pub fn top_artists(&self, limit: usize) -> Vec<String> {
        aggregate::value_counts(&self.dataset.records, Column::Artist)
            .into_iter()
            .take(limit)
            .map(|(artist, _)| artist)
            .collect()
    }

    /// Distinct non-null materials, sorted.
    pub fn material_options(&self) -> Vec<String> {
        self.dataset
            .records
            .iter()
            .filter_map(|r| r.material.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whole year domain, nothing else restricted.
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection::unrestricted(self.year_domain())
    }

    pub fn apply_filters(&self, selection: &FilterSelection) -> std::result::Result<ActiveView, ViewError> {
        filter::apply_filters(&self.dataset, selection)
    }

    pub fn kpis(&self, view: &ActiveView) -> Kpis {
        summary::summarize(view)
    }

    pub fn aggregation(
        &self,
        view: &ActiveView,
        spec: &AggregationSpec,
    ) -> std::result::Result<Aggregation, ViewError> {
        aggregate::aggregate(view, spec).inspect_err(|e| log::warn!("Skipping {spec:?}: {e}"))
    }

    pub fn sample(
        &self,
        view: &ActiveView,
        max_n: usize,
        seed: u64,
    ) -> std::result::Result<ActiveView, ViewError> {
        sample::sample(view, max_n, seed)
    }
}
