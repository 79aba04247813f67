use serde::Serialize;
use std::path::Path;

/// One peer's coefficient against the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationRow {
    pub alpha_id: String,
    pub correlation: f64,
}

/// The full peer vector for one target, sorted descending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationReport {
    rows: Vec<CorrelationRow>,
}

impl CorrelationReport {
    /// Builds the report from raw coefficients. `None` and NaN become `0.0`;
    /// values are clamped into `[-1, 1]` and rounded to 4 decimals.
    pub fn from_coefficients<I>(coefficients: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<f64>)>,
    {
        let mut rows: Vec<CorrelationRow> = coefficients
            .into_iter()
            .map(|(alpha_id, r)| CorrelationRow {
                alpha_id,
                correlation: normalize(r),
            })
            .collect();
        // Stable sort: ties keep the peer order of the region index.
        rows.sort_by(|a, b| b.correlation.total_cmp(&a.correlation));
        Self { rows }
    }

    pub fn rows(&self) -> &[CorrelationRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn top(&self) -> Option<&CorrelationRow> {
        self.rows.first()
    }

    /// The self-correlation score: the largest coefficient, or `0.0`.
    pub fn max(&self) -> f64 {
        self.top().map_or(0.0, |row| row.correlation)
    }

    /// Overwrites `path` with an `alpha_id,correlation` CSV.
    pub fn write_csv(&self, path: &Path) -> Result<(), crate::AnalyticsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        if self.rows.is_empty() {
            writer.write_record(["alpha_id", "correlation"])?;
        }
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn normalize(r: Option<f64>) -> f64 {
    match r {
        Some(v) if v.is_finite() => (v.clamp(-1.0, 1.0) * 10_000.0).round() / 10_000.0,
        _ => 0.0,
    }
}
