use crate::error::CoreError;
use chrono::{Months, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// The cumulative PnL of a single alpha, sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PnlSeries {
    alpha_id: String,
    points: Vec<(NaiveDate, f64)>,
}

impl PnlSeries {
    /// Builds a series from unordered points. Non-finite values are dropped and
    /// a repeated date keeps its last value.
    pub fn new(alpha_id: impl Into<String>, mut points: Vec<(NaiveDate, f64)>) -> Self {
        points.retain(|(_, v)| v.is_finite());
        points.sort_by_key(|(d, _)| *d);
        let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(points.len());
        for (date, value) in points {
            match deduped.last_mut() {
                Some(last) if last.0 == date => last.1 = value,
                _ => deduped.push((date, value)),
            }
        }
        Self {
            alpha_id: alpha_id.into(),
            points: deduped,
        }
    }

    pub fn alpha_id(&self) -> &str {
        &self.alpha_id
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    /// Daily returns over the trailing `window_years`, anchored on this
    /// series' own most recent date.
    pub fn returns(&self, window_years: u32) -> ReturnSeries {
        let values = match self.last_date() {
            Some(end) => difference(
                self.points.iter().map(|(d, v)| (*d, Some(*v))),
                window_start(end, window_years),
            ),
            None => BTreeMap::new(),
        };
        ReturnSeries {
            alpha_id: self.alpha_id.clone(),
            values,
        }
    }
}

/// Day-over-day differences of a forward-filled PnL series. Never stored;
/// always derived from the current cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    alpha_id: String,
    values: BTreeMap<NaiveDate, f64>,
}

impl ReturnSeries {
    pub fn alpha_id(&self) -> &str {
        &self.alpha_id
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.values.get(date).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &f64)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// First date strictly outside the window: only observations after it are kept.
fn window_start(end: NaiveDate, window_years: u32) -> NaiveDate {
    end.checked_sub_months(Months::new(window_years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

/// `value[t] - ffill(value)[t-1]`, keeping only dates after `start`.
///
/// Missing cells produce no return, and the first observed value has no
/// predecessor so it produces none either.
fn difference<I>(cells: I, start: NaiveDate) -> BTreeMap<NaiveDate, f64>
where
    I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
{
    let mut previous: Option<f64> = None;
    let mut out = BTreeMap::new();
    for (date, value) in cells {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            continue;
        };
        if let Some(prev) = previous {
            if date > start {
                out.insert(date, value - prev);
            }
        }
        previous = Some(value);
    }
    out
}

/// The wide PnL table: one row per date (ascending), one column per alpha id
/// (insertion order). Cells are `None` where an alpha has no observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PnlTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    // values[column][row]
    values: Vec<Vec<Option<f64>>>,
    // column id -> index into `columns`/`values`
    positions: HashMap<String, usize>,
}

impl PnlTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn assemble(dates: Vec<NaiveDate>, columns: Vec<String>, values: Vec<Vec<Option<f64>>>) -> Self {
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Self {
            dates,
            columns,
            values,
            positions,
        }
    }

    /// Rebuilds a table from its columnar parts, validating the shape.
    pub fn from_parts(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, CoreError> {
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoreError::Shape(
                "dates must be strictly ascending".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (id, cells) in columns {
            if cells.len() != dates.len() {
                return Err(CoreError::Shape(format!(
                    "column '{}' has {} cells for {} dates",
                    id,
                    cells.len(),
                    dates.len()
                )));
            }
            if !seen.insert(id.clone()) {
                return Err(CoreError::InvalidInput(
                    "columns".to_string(),
                    format!("duplicate column '{}'", id),
                ));
            }
            ids.push(id);
            values.push(cells);
        }
        Ok(Self::assemble(dates, ids, values))
    }

    pub fn from_series(series: Vec<PnlSeries>) -> Self {
        Self::new().outer_join(series)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// The raw cells of one column, aligned with [`PnlTable::dates`].
    pub fn cells(&self, id: &str) -> Option<&[Option<f64>]> {
        self.position(id).map(|i| self.values[i].as_slice())
    }

    /// Iterates `(id, cells)` in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&String, &[Option<f64>])> {
        self.columns
            .iter()
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// The observed (non-missing) points of one column as a series.
    pub fn column(&self, id: &str) -> Option<PnlSeries> {
        let cells = self.cells(id)?;
        let points = self
            .dates
            .iter()
            .zip(cells)
            .filter_map(|(d, v)| v.map(|v| (*d, v)))
            .collect();
        Some(PnlSeries::new(id, points))
    }

    /// Outer-joins new single-column series onto the table.
    ///
    /// Existing columns are never overwritten: a series whose id is already a
    /// column (or repeats within `series`) is skipped. The date index becomes
    /// the union of all dates, sorted ascending, and absent cells stay `None`.
    pub fn outer_join(&self, series: Vec<PnlSeries>) -> PnlTable {
        let mut known: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let mut fresh = Vec::new();
        for s in &series {
            if known.insert(s.alpha_id()) {
                fresh.push(s);
            } else {
                tracing::warn!(alpha_id = %s.alpha_id(), "Column already present; keeping the existing data.");
            }
        }
        if fresh.is_empty() {
            return self.clone();
        }

        let merged: BTreeSet<NaiveDate> = self
            .dates
            .iter()
            .copied()
            .chain(fresh.iter().flat_map(|s| s.points().iter().map(|(d, _)| *d)))
            .collect();
        let dates: Vec<NaiveDate> = merged.into_iter().collect();
        let row_of: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut columns = self.columns.clone();
        let mut values = Vec::with_capacity(self.values.len() + fresh.len());
        for old in &self.values {
            let mut cells = vec![None; dates.len()];
            for (date, value) in self.dates.iter().zip(old) {
                cells[row_of[date]] = *value;
            }
            values.push(cells);
        }
        for s in fresh {
            let mut cells = vec![None; dates.len()];
            for (date, value) in s.points() {
                cells[row_of[date]] = Some(*value);
            }
            columns.push(s.alpha_id().to_string());
            values.push(cells);
        }

        PnlTable::assemble(dates, columns, values)
    }

    /// A sub-table holding only `ids` (unknown ids are ignored). The date index
    /// is kept whole, so windows derived from it are still anchored on the
    /// full table's most recent date.
    pub fn select<'a, I>(&self, ids: I) -> PnlTable
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for id in ids {
            let Some(i) = self.position(id) else {
                continue;
            };
            if seen.insert(i) {
                columns.push(id.clone());
                values.push(self.values[i].clone());
            }
        }
        PnlTable::assemble(self.dates.clone(), columns, values)
    }

    /// Returns of one column, windowed relative to the table's last date.
    pub fn returns_of(&self, id: &str, window_years: u32) -> Option<ReturnSeries> {
        let cells = self.cells(id)?;
        let values = match self.last_date() {
            Some(end) => difference(
                self.dates.iter().copied().zip(cells.iter().copied()),
                window_start(end, window_years),
            ),
            None => BTreeMap::new(),
        };
        Some(ReturnSeries {
            alpha_id: id.to_string(),
            values,
        })
    }

    /// Returns of every column, in column order.
    pub fn returns_table(&self, window_years: u32) -> Vec<ReturnSeries> {
        self.columns
            .iter()
            .filter_map(|id| self.returns_of(id, window_years))
            .collect()
    }
}
