//! Data layer: core types, loading, filtering and writing.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv / RecordBatch / JSON records
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  QueryResult::to_table → ResultTable
//!   └──────────┘
//!        │
//!        ▼
//!   ┌─────────────┐
//!   │ ResultTable  │  Vec<Row>, ordered column names
//!   └─────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  predicate conjunction → new table sorted by `name`
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  writer   │  pretty / csv / json / parquet
//!   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
