use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, TableError};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a result table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as returned by an archive service.
/// Rows are sorted by arbitrary columns, so `CellValue` must be `Ord`.
/// Equality follows the same total order: `NaN == NaN`, `0.0 != -0.0`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so rows can be sorted by any column --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl CellValue {
    /// The text of a string cell; `None` for every other kind.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// ResultTable – the tabular form of a query result
// ---------------------------------------------------------------------------

/// One row: column_name → value. Columns absent from a row read as null.
pub type Row = BTreeMap<String, CellValue>;

static NULL: CellValue = CellValue::Null;

/// An ordered sequence of rows plus the ordered list of column names.
///
/// The column list is kept separately so a table with zero rows still knows
/// its columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultTable {
    column_names: Vec<String>,
    rows: Vec<Row>,
}

impl ResultTable {
    /// Build a table with an explicit column order.
    ///
    /// Keys found in rows but not in `column_names` are appended to the column
    /// list in sorted order.
    pub fn new(column_names: Vec<String>, rows: Vec<Row>) -> Self {
        let mut column_names = column_names;
        let mut extra: Vec<&String> = rows
            .iter()
            .flat_map(|row| row.keys())
            .filter(|k| !column_names.contains(k))
            .collect();
        extra.sort();
        extra.dedup();
        let extra: Vec<String> = extra.into_iter().cloned().collect();
        column_names.extend(extra);

        ResultTable { column_names, rows }
    }

    /// Build a table whose columns are the union of the row keys, sorted.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self::new(Vec::new(), rows)
    }

    /// An empty table with the given columns.
    pub fn empty(column_names: Vec<String>) -> Self {
        ResultTable {
            column_names,
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    /// Fail with [`TableError::MissingColumn`] unless `name` is a column.
    pub fn require_column(&self, name: &str) -> Result<()> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(TableError::missing_column(name))
        }
    }

    /// Value of `column` in `row`, null when the row lacks the key.
    pub fn cell<'a>(row: &'a Row, column: &str) -> &'a CellValue {
        row.get(column).unwrap_or(&NULL)
    }

    /// All values of a column in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&CellValue>> {
        self.require_column(name)?;
        Ok(self.rows.iter().map(|row| Self::cell(row, name)).collect())
    }

    /// Keep the rows whose mask entry is `true`. Columns are unchanged.
    ///
    /// # Panics
    /// If `mask` is not exactly one entry per row.
    pub fn filter_rows(&self, mask: &[bool]) -> ResultTable {
        assert_eq!(
            mask.len(),
            self.rows.len(),
            "mask length must equal the row count"
        );
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        ResultTable {
            column_names: self.column_names.clone(),
            rows,
        }
    }

    /// Stable ascending sort by one column.
    pub fn sort_by(&mut self, column: &str) -> Result<()> {
        self.require_column(column)?;
        self.rows
            .sort_by(|a, b| Self::cell(a, column).cmp(Self::cell(b, column)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn ordering_groups_by_kind_then_value() {
        let mut vals = vec![
            CellValue::from("b"),
            CellValue::Integer(3),
            CellValue::Null,
            CellValue::from("a"),
            CellValue::Bool(true),
            CellValue::Float(1.5),
        ];
        vals.sort();
        assert_eq!(
            vals,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Integer(3),
                CellValue::Float(1.5),
                CellValue::from("a"),
                CellValue::from("b"),
            ]
        );
    }

    #[test]
    fn string_order_is_bytewise() {
        assert!(CellValue::from("Z") < CellValue::from("a"));
        assert!(CellValue::from("hst_10") < CellValue::from("hst_9"));
    }

    #[test]
    fn equality_agrees_with_ordering() {
        let nan = CellValue::Float(f64::NAN);
        assert_eq!(nan.cmp(&nan), Ordering::Equal);
        assert_eq!(nan, nan.clone());
        assert_ne!(CellValue::Float(0.0), CellValue::Float(-0.0));
        assert_ne!(CellValue::Integer(1), CellValue::Float(1.0));

        let table = ResultTable::from_rows(vec![row(&[("ra", nan)])]);
        assert_eq!(table, table.clone());
    }

    #[test]
    fn new_appends_unlisted_row_keys() {
        let t = ResultTable::new(
            vec!["name".into()],
            vec![row(&[
                ("name", "x".into()),
                ("b", CellValue::Integer(1)),
                ("a", CellValue::Integer(2)),
            ])],
        );
        assert_eq!(t.column_names(), ["name", "a", "b"]);
    }

    #[test]
    fn column_reports_missing() {
        let t = ResultTable::empty(vec!["name".into()]);
        assert!(t.column("name").unwrap().is_empty());
        match t.column("insname") {
            Err(TableError::MissingColumn { column }) => assert_eq!(column, "insname"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn absent_key_reads_as_null() {
        let t = ResultTable::new(
            vec!["name".into(), "productType".into()],
            vec![row(&[("name", "a".into())])],
        );
        assert_eq!(t.column("productType").unwrap(), vec![&CellValue::Null]);
    }

    #[test]
    fn filter_rows_keeps_columns() {
        let t = ResultTable::from_rows(vec![
            row(&[("name", "a".into())]),
            row(&[("name", "b".into())]),
        ]);
        let none = t.filter_rows(&[false, false]);
        assert!(none.is_empty());
        assert_eq!(none.column_names(), ["name"]);

        let some = t.filter_rows(&[false, true]);
        assert_eq!(some.column("name").unwrap(), vec![&CellValue::from("b")]);
    }

    #[test]
    fn sort_is_stable() {
        let mut t = ResultTable::from_rows(vec![
            row(&[("name", "b".into()), ("i", CellValue::Integer(0))]),
            row(&[("name", "a".into()), ("i", CellValue::Integer(1))]),
            row(&[("name", "b".into()), ("i", CellValue::Integer(2))]),
            row(&[("name", "a".into()), ("i", CellValue::Integer(3))]),
        ]);
        t.sort_by("name").unwrap();
        let order: Vec<_> = t.column("i").unwrap().into_iter().cloned().collect();
        assert_eq!(
            order,
            vec![
                CellValue::Integer(1),
                CellValue::Integer(3),
                CellValue::Integer(0),
                CellValue::Integer(2),
            ]
        );
    }

    #[test]
    fn sort_by_missing_column_fails() {
        let mut t = ResultTable::empty(vec!["insname".into()]);
        assert!(matches!(
            t.sort_by("name"),
            Err(TableError::MissingColumn { .. })
        ));
    }
}
