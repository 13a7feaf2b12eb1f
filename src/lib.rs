//! Narrow HST and GALEX archive query results down to one observational
//! configuration per service.
//!
//! ```no_run
//! use archive_filter::{filter_hst_results, QueryResultFile};
//!
//! let previews = filter_hst_results(&QueryResultFile::new("hst_results.parquet"))?;
//! println!("{} WFC3/IR F128N previews", previews.len());
//! # Ok::<(), archive_filter::TableError>(())
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod error;

pub use config::{ConfigError, FilterConfig};
pub use data::filter::{filter_galex_results, filter_hst_results, Predicate, ResultFilter};
pub use data::loader::{QueryResult, QueryResultFile};
pub use data::model::{CellValue, ResultTable, Row};
pub use data::writer::{to_record_batch, write_table, OutputFormat};
pub use error::TableError;
