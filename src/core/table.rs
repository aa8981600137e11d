use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WaveError, WaveResult};

/// One table cell.
///
/// Numeric strings count as numbers wherever a number is needed, so tables
/// loaded from CSV-like sources plot without a conversion pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "Value")]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Null => Ok(()),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            Value::String(text) => Self::Text(text),
            Value::Bool(flag) => Self::Text(flag.to_string()),
            Value::Null => Self::Null,
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Column reference by header name or by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ColumnSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// How selected columns combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    /// Independent values per column.
    #[default]
    Group,
    /// Running sum across columns in declaration order.
    Stack,
    /// Per-row total collapsed into one column.
    Sum,
    /// Exactly two columns read as `[start, end]` per row.
    #[serde(alias = "range")]
    Interval,
}

/// Header row plus data rows. Every data row has the header's width.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table from rows where the first row holds the headers.
    pub fn new(mut rows: Vec<Vec<Cell>>) -> WaveResult<Self> {
        if rows.is_empty() {
            return Ok(Self::default());
        }

        let headers: Vec<String> = rows.remove(0).iter().map(Cell::to_string).collect();
        for (index, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(WaveError::InvalidData(format!(
                    "row {} has {} cells, header has {}",
                    index + 1,
                    row.len(),
                    headers.len()
                )));
            }
        }

        Ok(Self { headers, rows })
    }

    /// Parses an array of arrays, header row first.
    pub fn from_json(value: &Value) -> WaveResult<Self> {
        let array = value.as_array().ok_or_else(|| {
            WaveError::InvalidData("table must be a JSON array of rows".to_owned())
        })?;

        let rows = array
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|cells| cells.iter().cloned().map(Cell::from).collect::<Vec<Cell>>())
                    .ok_or_else(|| WaveError::InvalidData("table rows must be arrays".to_owned()))
            })
            .collect::<WaveResult<Vec<Vec<Cell>>>>()?;

        Self::new(rows)
    }

    /// Parses an array of objects; headers come from the first object's keys.
    pub fn from_records(value: &Value) -> WaveResult<Self> {
        let array = value.as_array().ok_or_else(|| {
            WaveError::InvalidData("records must be a JSON array of objects".to_owned())
        })?;
        let Some(first) = array.first() else {
            return Ok(Self::default());
        };
        let first = first
            .as_object()
            .ok_or_else(|| WaveError::InvalidData("records must be objects".to_owned()))?;

        let headers: Vec<String> = first.keys().cloned().collect();
        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let object = item
                .as_object()
                .ok_or_else(|| WaveError::InvalidData("records must be objects".to_owned()))?;
            rows.push(
                headers
                    .iter()
                    .map(|header| object.get(header).cloned().map_or(Cell::Null, Cell::from))
                    .collect(),
            );
        }

        Ok(Self { headers, rows })
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, selector: &ColumnSelector) -> WaveResult<usize> {
        let index = match selector {
            ColumnSelector::Index(index) => (*index < self.headers.len()).then_some(*index),
            ColumnSelector::Name(name) => self.headers.iter().position(|header| header == name),
        };
        index.ok_or_else(|| WaveError::ColumnNotFound {
            column: selector.to_string(),
        })
    }

    pub fn column(&self, selector: &ColumnSelector) -> WaveResult<Vec<Cell>> {
        let index = self.column_index(selector)?;
        Ok(self.rows.iter().map(|row| row[index].clone()).collect())
    }

    /// Column rendered as labels, in row order.
    pub fn labels(&self, selector: &ColumnSelector) -> WaveResult<Vec<String>> {
        let index = self.column_index(selector)?;
        Ok(self.rows.iter().map(|row| row[index].to_string()).collect())
    }

    /// Distinct labels of a column in first-appearance order.
    pub fn distinct_labels(&self, selector: &ColumnSelector) -> WaveResult<Vec<String>> {
        let mut seen = Vec::new();
        for label in self.labels(selector)? {
            if !seen.contains(&label) {
                seen.push(label);
            }
        }
        Ok(seen)
    }

    pub fn select(&self, columns: &[ColumnSelector], mode: SelectMode) -> WaveResult<Selection> {
        let mut selected = Vec::with_capacity(columns.len());
        for selector in columns {
            let index = self.column_index(selector)?;
            selected.push(SelectedColumn {
                header: self.headers[index].clone(),
                values: self.rows.iter().map(|row| row[index].as_number()).collect(),
            });
        }

        match mode {
            SelectMode::Sum => {
                let header = selected
                    .iter()
                    .map(|column| column.header.as_str())
                    .collect::<Vec<_>>()
                    .join("+");
                let values = (0..self.rows.len())
                    .map(|row| {
                        let cells = selected.iter().filter_map(|column| column.values[row]);
                        cells.fold(None, |total: Option<f64>, value| {
                            Some(total.unwrap_or(0.0) + value)
                        })
                    })
                    .collect();
                selected = vec![SelectedColumn { header, values }];
            }
            SelectMode::Interval if selected.len() != 2 => {
                return Err(WaveError::InvalidData(format!(
                    "interval selection needs exactly 2 columns, got {}",
                    selected.len()
                )));
            }
            _ => {}
        }

        Ok(Selection {
            mode,
            columns: selected,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedColumn {
    pub header: String,
    pub values: Vec<Option<f64>>,
}

/// Derived view over table columns under one [`SelectMode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    mode: SelectMode,
    columns: Vec<SelectedColumn>,
}

impl Selection {
    #[must_use]
    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    /// Per-column value lists in row order.
    #[must_use]
    pub fn data(&self) -> &[SelectedColumn] {
        &self.columns
    }

    #[must_use]
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.header.as_str()).collect()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |column| column.values.len())
    }

    /// `[start, end]` span for each column and row.
    ///
    /// `stack` spans accumulate in declaration order, `interval` yields one
    /// column spanning the two selected columns, other modes start at zero.
    #[must_use]
    pub fn spans(&self) -> Vec<Vec<(f64, f64)>> {
        match self.mode {
            SelectMode::Stack => {
                let mut running = vec![0.0; self.row_count()];
                self.columns
                    .iter()
                    .map(|column| {
                        column
                            .values
                            .iter()
                            .zip(running.iter_mut())
                            .map(|(value, total)| {
                                let start = *total;
                                *total += value.unwrap_or(0.0);
                                (start, *total)
                            })
                            .collect()
                    })
                    .collect()
            }
            SelectMode::Interval => {
                let [start, end] = [&self.columns[0], &self.columns[1]];
                vec![
                    start
                        .values
                        .iter()
                        .zip(&end.values)
                        .map(|(a, b)| (a.unwrap_or(0.0), b.unwrap_or(0.0)))
                        .collect(),
                ]
            }
            SelectMode::Group | SelectMode::Sum => self
                .columns
                .iter()
                .map(|column| {
                    column
                        .values
                        .iter()
                        .map(|value| (0.0, value.unwrap_or(0.0)))
                        .collect()
                })
                .collect(),
        }
    }

    /// `[min, max]` over every value this selection would plot.
    ///
    /// Stacked ranges cover the cumulative totals and the zero baseline.
    /// An empty selection yields `(0.0, 0.0)`.
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        let values: Vec<f64> = match self.mode {
            SelectMode::Stack => self
                .spans()
                .into_iter()
                .flatten()
                .flat_map(|(start, end)| [start, end])
                .collect(),
            _ => self
                .columns
                .iter()
                .flat_map(|column| column.values.iter().flatten().copied())
                .collect(),
        };

        let min = values.iter().copied().map(OrderedFloat).min();
        let max = values.iter().copied().map(OrderedFloat).max();
        match (min, max) {
            (Some(min), Some(max)) => (min.0, max.0),
            _ => (0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            vec!["yr".into(), "a".into(), "b".into()],
            vec!["2020".into(), 10.into(), 20.into()],
            vec!["2021".into(), 15.into(), 5.into()],
        ])
        .expect("table")
    }

    #[test]
    fn stack_range_covers_cumulative_total() {
        let selection = sample()
            .select(&["a".into(), "b".into()], SelectMode::Stack)
            .expect("select");
        assert_eq!(selection.range(), (0.0, 30.0));
    }

    #[test]
    fn group_range_is_plain_extent() {
        let selection = sample()
            .select(&["a".into(), "b".into()], SelectMode::Group)
            .expect("select");
        assert_eq!(selection.range(), (5.0, 20.0));
    }

    #[test]
    fn sum_collapses_into_one_column() {
        let selection = sample()
            .select(&["a".into(), ColumnSelector::Index(2)], SelectMode::Sum)
            .expect("select");
        assert_eq!(selection.data().len(), 1);
        assert_eq!(selection.data()[0].header, "a+b");
        assert_eq!(selection.data()[0].values, vec![Some(30.0), Some(20.0)]);
        assert_eq!(selection.range(), (20.0, 30.0));
    }

    #[test]
    fn unknown_column_is_reported() {
        let err = sample()
            .select(&["missing".into()], SelectMode::Group)
            .expect_err("unknown column");
        assert!(matches!(err, WaveError::ColumnNotFound { column } if column == "missing"));
    }

    #[test]
    fn malformed_row_is_rejected() {
        let err = Table::new(vec![vec!["a".into(), "b".into()], vec![1.into()]])
            .expect_err("short row");
        assert!(matches!(err, WaveError::InvalidData(_)));
    }

    #[test]
    fn interval_requires_two_columns() {
        let table = sample();
        assert!(table.select(&["a".into()], SelectMode::Interval).is_err());
        let selection = table
            .select(&["b".into(), "a".into()], SelectMode::Interval)
            .expect("interval");
        assert_eq!(selection.spans(), vec![vec![(20.0, 10.0), (5.0, 15.0)]]);
        assert_eq!(selection.range(), (5.0, 20.0));
    }

    #[test]
    fn records_and_numeric_strings_load() {
        let value = serde_json::json!([{"k": "x", "v": "3.5"}, {"k": "y", "v": 4}]);
        let table = Table::from_records(&value).expect("records");
        assert_eq!(table.headers(), ["k", "v"]);
        let selection = table.select(&["v".into()], SelectMode::Group).expect("select");
        assert_eq!(selection.range(), (3.5, 4.0));
    }

    #[test]
    fn records_keep_their_written_column_order() {
        let value = serde_json::json!([
            {"yr": "2020", "sales": 10, "avg": 4},
            {"yr": "2021", "sales": 15, "avg": 6}
        ]);
        let table = Table::from_records(&value).expect("records");
        assert_eq!(table.headers(), ["yr", "sales", "avg"]);
        assert_eq!(
            table.labels(&ColumnSelector::from(0)).expect("labels"),
            ["2020", "2021"]
        );
    }

    #[test]
    fn empty_table_selects_nothing() {
        let table = Table::new(Vec::new()).expect("empty");
        assert!(table.is_empty());
        assert!(table.select(&["a".into()], SelectMode::Group).is_err());
    }
}
