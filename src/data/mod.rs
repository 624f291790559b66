/// Data layer: core types, loading, row access, and filtered views.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  ingest   │  parse file → ColumnBatch
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode, pick title, drop reserved → merge into AttributeSet
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐      ┌──────────┐
///   │ Dataframe  │ ───▶ │  filter   │  value predicates → indices → filtered view
///   └───────────┘      └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   rows    │  indices → rows / compact rows / columns
///   └──────────┘
/// ```

pub mod filter;
pub mod frame;
pub mod ingest;
pub mod loader;
pub mod model;
pub mod rows;
