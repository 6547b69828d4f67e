//! Filter-and-aggregate core of the auction performance dashboard.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;

pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use data::aggregate::{Aggregation, AggregationSpec, PivotTable, RankedRow, RankedTable, Reducer};
pub use data::filter::{ActiveView, FilterSelection};
pub use data::model::{AuctionDataset, AuctionRecord, Column, Schema, YearDomain};
pub use data::summary::Kpis;
pub use error::{LoadError, ViewError};
