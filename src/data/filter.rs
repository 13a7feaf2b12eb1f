use log::debug;
use serde::{Deserialize, Serialize};

use super::loader::QueryResult;
use super::model::{ResultTable, Row};
use crate::error::{Result, TableError};

// ---------------------------------------------------------------------------
// Column names and literals of the two archive services
// ---------------------------------------------------------------------------

pub const COL_INSTRUMENT: &str = "insname";
pub const COL_PRODUCT_TYPE: &str = "productType";
pub const COL_BANDPASS: &str = "energy_bandpassName";
pub const COL_NAME: &str = "name";

pub const HST_INSTRUMENT: &str = "WFC3/IR";
pub const HST_PRODUCT_TYPE: &str = "preview";
pub const HST_BANDPASS: &str = "F128N";

pub const GALEX_PRODUCT_TYPE: &str = "PREVIEW";
pub const GALEX_TARGET: &str = "_M82";
pub const GALEX_SIZE: &str = "large";

// ---------------------------------------------------------------------------
// Predicate: one per-column test
// ---------------------------------------------------------------------------

/// A single column test. Both kinds compare text exactly as stored
/// (case-sensitive, no trimming, no patterns).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// The cell is a string equal to `value`.
    Equals { column: String, value: String },
    /// The cell is a string containing `needle`.
    Contains { column: String, needle: String },
}

impl Predicate {
    pub fn equals(column: &str, value: &str) -> Self {
        Predicate::Equals {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn contains(column: &str, needle: &str) -> Self {
        Predicate::Contains {
            column: column.to_string(),
            needle: needle.to_string(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Equals { column, .. } | Predicate::Contains { column, .. } => column,
        }
    }

    /// Evaluate against one row. `index` only labels errors.
    ///
    /// Equality against a non-string cell is simply false; a substring test
    /// on a cell that is neither text nor null is a [`TableError::NotText`].
    pub fn eval(&self, row: &Row, index: usize) -> Result<bool> {
        let cell = ResultTable::cell(row, self.column());
        match self {
            Predicate::Equals { value, .. } => Ok(cell.as_str() == Some(value.as_str())),
            Predicate::Contains { column, needle } => match cell.as_str() {
                Some(text) => Ok(text.contains(needle.as_str())),
                None if cell.is_null() => Ok(false),
                None => Err(TableError::NotText {
                    column: column.clone(),
                    row: index,
                }),
            },
        }
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Equals { column, value } => write!(f, "{column} == {value:?}"),
            Predicate::Contains { column, needle } => write!(f, "{needle:?} in {column}"),
        }
    }
}

// ---------------------------------------------------------------------------
// ResultFilter: predicate conjunction + sort
// ---------------------------------------------------------------------------

fn default_sort_by() -> String {
    COL_NAME.to_string()
}

/// A named conjunction of predicates followed by an ascending sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFilter {
    #[serde(default, skip_serializing)]
    pub name: String,
    pub predicates: Vec<Predicate>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

impl ResultFilter {
    /// WFC3/IR previews taken through the F128N narrow-band filter.
    pub fn hst() -> Self {
        ResultFilter {
            name: "hst".to_string(),
            predicates: vec![
                Predicate::equals(COL_INSTRUMENT, HST_INSTRUMENT),
                Predicate::equals(COL_PRODUCT_TYPE, HST_PRODUCT_TYPE),
                Predicate::equals(COL_BANDPASS, HST_BANDPASS),
            ],
            sort_by: COL_NAME.to_string(),
        }
    }

    /// Large-format M82 previews.
    ///
    /// The name test wants the literal `_M82`, so a name starting with `M82`
    /// (no underscore) is rejected.
    pub fn galex() -> Self {
        ResultFilter {
            name: "galex".to_string(),
            predicates: vec![
                Predicate::equals(COL_PRODUCT_TYPE, GALEX_PRODUCT_TYPE),
                Predicate::contains(COL_NAME, GALEX_TARGET),
                Predicate::contains(COL_NAME, GALEX_SIZE),
            ],
            sort_by: COL_NAME.to_string(),
        }
    }

    /// Every column this filter reads, sort column last.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = self.predicates.iter().map(Predicate::column).collect();
        cols.push(&self.sort_by);
        cols.dedup();
        cols
    }

    /// Whether `row` satisfies every predicate.
    ///
    /// Every predicate is evaluated, even after one has failed, so a
    /// non-text cell is reported whatever the other columns hold.
    pub fn matches(&self, row: &Row, index: usize) -> Result<bool> {
        let mut all = true;
        for p in &self.predicates {
            all &= p.eval(row, index)?;
        }
        Ok(all)
    }

    /// Convert a query result to a table, then filter and sort it.
    pub fn apply<Q: QueryResult + ?Sized>(&self, query_result: &Q) -> Result<ResultTable> {
        let table = query_result.to_table()?;
        self.apply_table(&table)
    }

    /// Filter and sort an existing table. The input is left untouched.
    ///
    /// Columns are checked before any row is evaluated, so a table that lacks
    /// one fails even when it has no rows.
    pub fn apply_table(&self, table: &ResultTable) -> Result<ResultTable> {
        for col in self.required_columns() {
            table.require_column(col)?;
        }

        let mask = table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| self.matches(row, i))
            .collect::<Result<Vec<bool>>>()?;

        let mut filtered = table.filter_rows(&mask);
        filtered.sort_by(&self.sort_by)?;

        debug!(
            "filter '{}': kept {} of {} rows",
            self.name,
            filtered.len(),
            table.len()
        );
        Ok(filtered)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Narrow an HST query result to WFC3/IR F128N previews, sorted by `name`.
pub fn filter_hst_results<Q: QueryResult + ?Sized>(query_result: &Q) -> Result<ResultTable> {
    ResultFilter::hst().apply(query_result)
}

/// Narrow a GALEX query result to large M82 previews, sorted by `name`.
pub fn filter_galex_results<Q: QueryResult + ?Sized>(query_result: &Q) -> Result<ResultTable> {
    ResultFilter::galex().apply(query_result)
}
