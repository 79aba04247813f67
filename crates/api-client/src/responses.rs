use crate::error::ApiError;
use chrono::NaiveDate;
use core_types::{Alpha, PnlSeries, Region, Stage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Every endpoint gets an explicit schema. Missing required fields are decode
// errors, not silent defaults.

/// One page of `GET /users/self/alphas`.
#[derive(Debug, Clone, Deserialize)]
pub struct AlphaListResponse {
    /// Total number of alphas matching the filter (not just this page).
    pub count: usize,
    pub results: Vec<AlphaRecord>,
}

/// An alpha as returned by the listing and by `GET /alphas/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AlphaRecord {
    pub id: String,
    pub stage: String,
    pub settings: AlphaSettings,
    #[serde(default)]
    pub classifications: Vec<ClassificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlphaSettings {
    pub region: String,
    // There are more fields (universe, delay, decay...), but only the region
    // matters for correlation scoping.
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationRecord {
    pub name: String,
}

impl From<AlphaRecord> for Alpha {
    fn from(record: AlphaRecord) -> Self {
        Alpha {
            id: record.id,
            region: Region::new(record.settings.region),
            stage: Stage::from(record.stage),
            classifications: record.classifications.into_iter().map(|c| c.name).collect(),
        }
    }
}

/// The body of `GET /alphas/{id}/recordsets/pnl`: a column schema plus
/// row-major records.
#[derive(Debug, Clone, Deserialize)]
pub struct PnlRecordSet {
    pub schema: RecordSchema,
    pub records: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordSchema {
    pub properties: Vec<RecordProperty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordProperty {
    pub name: String,
}

impl PnlRecordSet {
    /// Reshapes the record set into a `(date, pnl)` series named by `alpha_id`.
    /// Rows with a null PnL carry no observation and are skipped.
    pub fn into_series(self, alpha_id: &str) -> Result<PnlSeries, ApiError> {
        let column = |name: &str| {
            self.schema
                .properties
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| {
                    ApiError::InvalidData(format!("pnl record set for {} has no '{}' column", alpha_id, name))
                })
        };
        let date_col = column("date")?;
        let pnl_col = column("pnl")?;

        let mut points = Vec::with_capacity(self.records.len());
        for row in &self.records {
            let date = row
                .get(date_col)
                .and_then(Value::as_str)
                .ok_or_else(|| ApiError::InvalidData(format!("missing date in row {:?}", row)))?;
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| ApiError::InvalidData(format!("invalid date '{}': {}", date, e)))?;
            match row.get(pnl_col) {
                Some(Value::Null) | None => continue,
                Some(v) => {
                    let pnl = v
                        .as_f64()
                        .ok_or_else(|| ApiError::InvalidData(format!("non-numeric pnl {} on {}", v, date)))?;
                    points.push((date, pnl));
                }
            }
        }

        Ok(PnlSeries::new(alpha_id, points))
    }
}

/// Query string of the alpha listing.
#[derive(Debug, Serialize)]
pub(crate) struct ListQuery<'a> {
    pub stage: &'a str,
    pub limit: usize,
    pub offset: usize,
    pub order: &'a str,
}
