use crate::correlation::pearson;
use crate::error::AnalyticsError;
use crate::report::CorrelationReport;
use configuration::CorrelationSettings;
use core_types::{Alpha, PnlSeries, PnlTable, RegionIndex};
use std::path::{Path, PathBuf};

/// Result of scoring one target.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfCorrelation {
    pub score: f64,
    /// `None` when the target's region had no cached peers.
    pub report: Option<CorrelationReport>,
}

/// Scores a target alpha against its cached same-region peers.
#[derive(Debug, Clone)]
pub struct SelfCorrelationEngine {
    settings: CorrelationSettings,
    report_dir: PathBuf,
}

impl SelfCorrelationEngine {
    pub fn new(settings: CorrelationSettings, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            report_dir: report_dir.into(),
        }
    }

    pub fn settings(&self) -> &CorrelationSettings {
        &self.settings
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_dir.join(&self.settings.report_file)
    }

    /// Maximum correlation of `target` against the peers listed for its
    /// region in `index` and present in `table`.
    ///
    /// The target's returns are windowed on its own last date; the peers'
    /// on the table's last date. The target id is never its own peer. With
    /// no peers the score is `0.0` and no report is written; otherwise the
    /// report file is overwritten before returning. A target without
    /// observations correlates with nothing and scores `0.0`.
    pub fn score(
        &self,
        target: &Alpha,
        target_pnl: &PnlSeries,
        index: Option<&RegionIndex>,
        table: Option<&PnlTable>,
    ) -> Result<SelfCorrelation, AnalyticsError> {
        let (Some(index), Some(table)) = (index, table) else {
            return Ok(self.cold(target));
        };
        let peers: Vec<&String> = index
            .peers(&target.region)
            .unwrap_or_default()
            .iter()
            .filter(|id| **id != target.id && table.contains(id))
            .collect();
        if peers.is_empty() {
            return Ok(self.cold(target));
        }

        let window = self.settings.window_years;
        let target_returns = target_pnl.returns(window);
        let peer_returns = table.select(peers).returns_table(window);

        let report = CorrelationReport::from_coefficients(
            peer_returns
                .iter()
                .map(|peer| (peer.alpha_id().to_string(), pearson(&target_returns, peer))),
        );

        let path = self.report_path();
        report.write_csv(&path)?;
        let score = report.max();
        tracing::info!(
            alpha_id = %target.id,
            region = %target.region,
            peers = report.rows().len(),
            score,
            report = %path.display(),
            "Computed self-correlation."
        );

        Ok(SelfCorrelation {
            score,
            report: Some(report),
        })
    }

    fn cold(&self, target: &Alpha) -> SelfCorrelation {
        tracing::warn!(
            alpha_id = %target.id,
            region = %target.region,
            "No cached peers for region; self-correlation is 0."
        );
        SelfCorrelation {
            score: 0.0,
            report: None,
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use core_types::{Region, Stage};

    fn series(id: &str, cumulative: &[f64]) -> PnlSeries {
        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let points = cumulative
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Days::new(i as u64), *v))
            .collect();
        PnlSeries::new(id, points)
    }

    fn alpha(id: &str, region: &str) -> Alpha {
        Alpha {
            id: id.to_string(),
            region: Region::from(region),
            stage: Stage::OutOfSample,
            classifications: Vec::new(),
        }
    }

    fn usa_universe() -> (RegionIndex, PnlTable) {
        let table = PnlTable::from_series(vec![
            series("A", &[0.0, 2.0, 1.0, 4.0, 4.5, 3.0]),
            series("B", &[0.0, 1.0, 3.0, 2.0, 6.0, 5.0]),
            series("C", &[0.0, -1.0, 0.5, 0.0, -2.0, 1.0]),
        ]);
        let index = ["A", "B", "C"]
            .into_iter()
            .map(|id| (Region::from("USA"), id.to_string()))
            .collect();
        (index, table)
    }

    #[test]
    fn duplicate_of_a_cached_peer_scores_one() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SelfCorrelationEngine::new(CorrelationSettings::default(), dir.path());
        let (index, table) = usa_universe();
        let d = series("D", &[7.0, 8.0, 10.0, 9.0, 13.0, 12.0]);

        let result = engine
            .score(&alpha("D", "USA"), &d, Some(&index), Some(&table))
            .unwrap();

        assert_eq!(result.score, 1.0);
        let report = result.report.unwrap();
        let top = report.top().unwrap();
        assert_eq!((top.alpha_id.as_str(), top.correlation), ("B", 1.0));
        assert!(report
            .rows()
            .iter()
            .all(|r| (-1.0..=1.0).contains(&r.correlation)));

        let written = std::fs::read_to_string(engine.report_path()).unwrap();
        assert!(written.starts_with("alpha_id,correlation\nB,1"));
    }

    #[test]
    fn region_without_peers_scores_zero() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SelfCorrelationEngine::new(CorrelationSettings::default(), dir.path());
        let (index, table) = usa_universe();
        let d = series("D", &[0.0, 1.0, 3.0]);

        let result = engine
            .score(&alpha("D", "CHN"), &d, Some(&index), Some(&table))
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.report.is_none());
        assert!(!engine.report_path().exists());

        let cold = engine.score(&alpha("D", "USA"), &d, None, None).unwrap();
        assert_eq!(cold.score, 0.0);
    }

    #[test]
    fn target_is_never_its_own_peer() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SelfCorrelationEngine::new(CorrelationSettings::default(), dir.path());
        let (index, table) = usa_universe();
        let b = table.column("B").unwrap();

        let result = engine
            .score(&alpha("B", "USA"), &b, Some(&index), Some(&table))
            .unwrap();

        let report = result.report.unwrap();
        assert!(report.rows().iter().all(|r| r.alpha_id != "B"));
        assert_eq!(report.rows().len(), 2);
        assert!(result.score < 1.0);
    }

    #[test]
    fn indexed_peers_missing_from_table_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SelfCorrelationEngine::new(CorrelationSettings::default(), dir.path());
        let (mut index, table) = usa_universe();
        index.insert(Region::from("EUR"), "ghost");
        let d = series("D", &[0.0, 1.0, 3.0]);

        let result = engine
            .score(&alpha("D", "EUR"), &d, Some(&index), Some(&table))
            .unwrap();
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn empty_target_scores_zero_on_a_cold_cache() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SelfCorrelationEngine::new(CorrelationSettings::default(), dir.path());

        let result = engine
            .score(&alpha("D", "USA"), &series("D", &[]), None, None)
            .unwrap();
        assert_eq!(result.score, 0.0);
        assert!(result.report.is_none());
    }

    #[test]
    fn empty_target_scores_zero_against_warm_peers() {
        let dir = tempfile::tempdir().unwrap();
        let engine = SelfCorrelationEngine::new(CorrelationSettings::default(), dir.path());
        let (index, table) = usa_universe();

        let result = engine
            .score(&alpha("D", "USA"), &series("D", &[]), Some(&index), Some(&table))
            .unwrap();

        assert_eq!(result.score, 0.0);
        let report = result.report.unwrap();
        assert_eq!(report.rows().len(), 3);
        assert!(report.rows().iter().all(|r| r.correlation == 0.0));
        assert!(engine.report_path().exists());
    }
}
