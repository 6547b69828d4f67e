/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  first existing candidate → AuctionDataset (loaded once)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year / artist / material predicates → ActiveView
///   └──────────┘
///        │
///        ├──► derive     (area = height × width)
///        ├──► aggregate  (ranked tables, shares, pivot)
///        ├──► summary    (total / count / mean / median)
///        └──► sample     (bounded, seeded scatter input)
/// ```

pub mod aggregate;
pub mod derive;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;
pub mod summary;
