use std::collections::BTreeSet;

use auction_lens::data::derive::ensure_area;
use auction_lens::data::sample::{scatter_points, ScatterPoint};
use auction_lens::{
    ActiveView, Aggregation, AggregationSpec, Column, Dashboard, FilterSelection, Kpis, Reducer,
    ViewError,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Control enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    Artist,
    Material,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareStyle {
    Share,
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    PriceByMaterial,
    AreaVsPrice,
    TopArtistsAverage,
    CountryAverage,
    PriceVsBrightness,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::PriceByMaterial,
        Tab::AreaVsPrice,
        Tab::TopArtistsAverage,
        Tab::CountryAverage,
        Tab::PriceVsBrightness,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::PriceByMaterial => "Price by Material",
            Tab::AreaVsPrice => "Area vs Price",
            Tab::TopArtistsAverage => "Top Artists (Avg Price)",
            Tab::CountryAverage => "Country-wise Avg Price",
            Tab::PriceVsBrightness => "Price vs Brightness",
        }
    }
}

// ---------------------------------------------------------------------------
// Computed sections
// ---------------------------------------------------------------------------

pub type Section = Result<Aggregation, ViewError>;
pub type ScatterSection = Result<Vec<ScatterPoint>, ViewError>;

/// Everything the central panel draws, recomputed only when a control changes.
pub struct Sections {
    pub kpis: Kpis,
    pub artists_by_sales: Section,
    pub materials_by_average: Section,
    pub countries_by_sales: Section,
    pub brightness_scatter: ScatterSection,
    pub artist_share: Section,
    pub heatmap: Section,
    pub material_tab: Section,
    pub area_scatter: ScatterSection,
    pub artists_by_average: Section,
    pub countries_by_average: Section,
    pub brightness_tab_scatter: ScatterSection,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub dashboard: Dashboard,

    /// Current sidebar choices.
    pub selection: FilterSelection,

    /// Artist picker entries (most frequent first).
    pub artist_options: Vec<String>,

    /// Material picker entries (sorted).
    pub material_options: Vec<String>,

    /// Sections for the current view, or the reason there is nothing to show.
    pub sections: Result<Sections, ViewError>,

    /// Colours for the `dominantcolor` scatter series.
    pub color_map: Option<ColorMap>,

    pub share_top_n: usize,
    pub share_style: ShareStyle,
    pub heatmap_countries: usize,
    pub heatmap_materials: usize,
    pub material_reducer: Reducer,
    pub tab: Tab,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        let limits = dashboard.config().limits.clone();
        let artist_options = if dashboard.has_column(Column::Artist) {
            dashboard.top_artists(limits.artist_options)
        } else {
            Vec::new()
        };
        let material_options = if dashboard.has_column(Column::Material) {
            dashboard.material_options()
        } else {
            Vec::new()
        };
        let color_map = dashboard.has_column(Column::DominantColor).then(|| {
            ColorMap::new(
                dashboard
                    .dataset()
                    .records
                    .iter()
                    .filter_map(|r| r.dominantcolor.as_deref()),
            )
        });

        let mut state = Self {
            selection: dashboard.default_selection(),
            dashboard,
            artist_options,
            material_options,
            sections: Err(ViewError::EmptyResult),
            color_map,
            share_top_n: limits.artist_share,
            share_style: ShareStyle::Share,
            heatmap_countries: limits.heatmap_countries,
            heatmap_materials: limits.heatmap_materials,
            material_reducer: Reducer::Sum,
            tab: Tab::PriceByMaterial,
        };
        state.refilter();
        state
    }

    /// Recompute the active view and every section after a control change.
    pub fn refilter(&mut self) {
        self.sections = self
            .dashboard
            .apply_filters(&self.selection)
            .map(|view| self.compute_sections(ensure_area(view)));
    }

    fn compute_sections(&self, view: ActiveView) -> Sections {
        let d = &self.dashboard;
        let limits = &d.config().limits;
        let sampling = &d.config().sampling;
        let colour = Some(Column::DominantColor);

        let scatter = |x: Column, max_n: usize| -> ScatterSection {
            view.require(&[x, Column::Price])?;
            let sampled = d.sample(&view, max_n, sampling.seed)?;
            scatter_points(&sampled, x, Column::Price, colour)
        };

        Sections {
            kpis: d.kpis(&view),
            artists_by_sales: d.aggregation(
                &view,
                &AggregationSpec::total_price(Column::Artist, limits.artists_by_sales),
            ),
            materials_by_average: d.aggregation(
                &view,
                &AggregationSpec::average_price(Column::Material, limits.materials_by_average),
            ),
            countries_by_sales: d.aggregation(
                &view,
                &AggregationSpec::total_price(Column::Country, limits.countries_by_sales),
            ),
            brightness_scatter: scatter(Column::Brightness, sampling.scatter_max),
            artist_share: d.aggregation(
                &view,
                &AggregationSpec::Share {
                    group: Column::Artist,
                    measure: Column::Price,
                    top_n: self.share_top_n,
                },
            ),
            heatmap: d.aggregation(
                &view,
                &AggregationSpec::CrossTab {
                    rows: Column::Country,
                    columns: Column::Material,
                    measure: Column::Price,
                    top_rows: self.heatmap_countries,
                    top_columns: self.heatmap_materials,
                },
            ),
            material_tab: d.aggregation(
                &view,
                &AggregationSpec::Ranked {
                    group: Column::Material,
                    measure: Column::Price,
                    reducer: self.material_reducer,
                    top_n: limits.material_tab,
                },
            ),
            area_scatter: scatter(Column::Area, sampling.tab_scatter_max),
            artists_by_average: d.aggregation(
                &view,
                &AggregationSpec::average_price(Column::Artist, limits.artists_by_average),
            ),
            countries_by_average: d.aggregation(
                &view,
                &AggregationSpec::average_price(Column::Country, limits.countries_by_average),
            ),
            brightness_tab_scatter: scatter(Column::Brightness, sampling.tab_scatter_max),
        }
    }

    pub fn selected(&self, dim: FilterDimension) -> &BTreeSet<String> {
        match dim {
            FilterDimension::Artist => &self.selection.artists,
            FilterDimension::Material => &self.selection.materials,
        }
    }

    pub fn options(&self, dim: FilterDimension) -> &[String] {
        match dim {
            FilterDimension::Artist => &self.artist_options,
            FilterDimension::Material => &self.material_options,
        }
    }

    fn selected_mut(&mut self, dim: FilterDimension) -> &mut BTreeSet<String> {
        match dim {
            FilterDimension::Artist => &mut self.selection.artists,
            FilterDimension::Material => &mut self.selection.materials,
        }
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle(&mut self, dim: FilterDimension, value: &str) {
        let selected = self.selected_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Clear a dimension's restriction (show everything).
    pub fn clear(&mut self, dim: FilterDimension) {
        self.selected_mut(dim).clear();
        self.refilter();
    }

    /// Keep `lo <= hi` after either slider moved, then refilter.
    pub fn set_year_range(&mut self, lo: i32, hi: i32) {
        self.selection.year_range = (lo.min(hi), hi.max(lo));
        self.refilter();
    }
}
