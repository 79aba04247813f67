use crate::error::EngineError;
use analytics::SelfCorrelationEngine;
use api_client::fetcher::Fetcher;
use api_client::{AlphaClient, Channel, sign_in};
use configuration::{Config, Credentials, TagScope};
use core_types::{Alpha, PnlSeries, PnlTable, RegionIndex};
use database::{CacheState, CacheStore, FsBlobStore};
use retriever::PnlRetriever;
use std::sync::Arc;

pub mod error;

/// How much of the remote universe a sync looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Only the newest listing page, on top of the cached state. Falls back
    /// to `Full` when the cache is empty.
    Incremental,
    /// The whole listing, starting from an empty state.
    Full,
}

/// What a sync changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    pub new_alphas: usize,
    pub total_alphas: usize,
    /// `(alpha_id, error)` for alphas whose PnL could not be fetched.
    pub failed: Vec<(String, String)>,
}

/// Scores of a batch, plus the targets that could not be scored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchScores {
    pub scores: Vec<(String, f64)>,
    /// `(alpha_id, error)` for every target whose record or PnL failed.
    pub failed: Vec<(String, String)>,
}

/// The central orchestrator: catalog, retriever, cache and correlation
/// engine wired together from one `Config`.
pub struct Workbench {
    config: Config,
    client: AlphaClient,
    retriever: PnlRetriever,
    cache: CacheStore<FsBlobStore>,
    correlation: SelfCorrelationEngine,
}

impl Workbench {
    /// Builds a workbench on top of an already authenticated channel.
    pub fn new(config: Config, channel: Arc<dyn Channel>) -> Self {
        let fetcher = Fetcher::new(channel, config.fetcher.clone());
        let client = AlphaClient::new(fetcher, &config.api.base_url);
        let retriever = PnlRetriever::new(client.clone(), config.retriever.clone());
        let cache = CacheStore::new(FsBlobStore::new(&config.cache.data_dir));
        let correlation =
            SelfCorrelationEngine::new(config.correlation.clone(), &config.cache.data_dir);

        Self {
            config,
            client,
            retriever,
            cache,
            correlation,
        }
    }

    /// Signs in with the credentials from the environment and builds the
    /// workbench on the resulting session.
    pub async fn connect(config: Config) -> Result<Self, EngineError> {
        let credentials = Credentials::from_env()?;
        let session = sign_in(&config.api, &credentials).await?;
        Ok(Self::new(config, Arc::new(session)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lists the remote universe, fetches the PnL of alphas not cached yet,
    /// and saves the merged state.
    pub async fn sync(&self, mode: SyncMode) -> Result<SyncSummary, EngineError> {
        let catalog = &self.config.catalog;
        let (state, page_size, first_page_only) = match mode {
            SyncMode::Incremental => {
                let state = self.cache.load();
                if state.is_empty() {
                    tracing::info!("Cache is empty; running a full sync instead.");
                    (CacheState::default(), catalog.page_size, false)
                } else {
                    (state, catalog.incremental_page_size, true)
                }
            }
            SyncMode::Full => (CacheState::default(), catalog.page_size, false),
        };

        let listed = self
            .client
            .list_alphas(&catalog.stage, &catalog.order, page_size, first_page_only)
            .await?;
        let new_alphas: Vec<Alpha> = listed
            .into_iter()
            .filter(|a| !state.table.contains(&a.id))
            .collect();
        tracing::info!(?mode, new = new_alphas.len(), "Listed alphas.");

        let CacheState {
            index,
            table,
            mut partition_tags,
        } = state;
        let outcome = self
            .retriever
            .get_pnls(&new_alphas, Some(index), Some(table))
            .await?;

        let tag = &self.config.correlation.partition_tag;
        for alpha in &new_alphas {
            if alpha.has_classification(tag) && outcome.index.contains(&alpha.id) {
                partition_tags.insert(alpha.id.clone());
            }
        }

        let state = CacheState {
            index: outcome.index,
            table: outcome.table,
            partition_tags,
        };
        self.cache.save(&state)?;

        let summary = SyncSummary {
            new_alphas: outcome.fetched,
            total_alphas: state.table.width(),
            failed: outcome.failed,
        };
        tracing::info!(
            new = summary.new_alphas,
            total = summary.total_alphas,
            failed = summary.failed.len(),
            "Sync complete."
        );
        Ok(summary)
    }

    /// The cached universe restricted to `scope`, ready for scoring.
    pub fn load_universe(&self, scope: TagScope) -> (RegionIndex, PnlTable) {
        let state = self.cache.load();
        let index = analyzer::filter(&state.index, &state.partition_tags, scope);
        let table = state.table.select(index.ids());
        (index, table)
    }

    /// Self-correlation of one alpha against the supplied universe.
    ///
    /// The alpha record is always fetched (for its region). Its PnL is
    /// fetched only when `target_pnl` is `None`; the series used is returned
    /// alongside the score so batch callers can reuse it.
    pub async fn self_correlation(
        &self,
        alpha_id: &str,
        index: Option<&RegionIndex>,
        table: Option<&PnlTable>,
        target_pnl: Option<PnlSeries>,
    ) -> Result<(f64, PnlSeries), EngineError> {
        let target = self.client.alpha(alpha_id).await?;
        let pnl = match target_pnl {
            Some(pnl) => pnl,
            None => self.retriever.get_pnl(alpha_id).await?,
        };
        let result = self.correlation.score(&target, &pnl, index, table)?;
        Ok((result.score, pnl))
    }

    /// Scores several alphas in turn against one loaded universe. The report
    /// file is overwritten per target; the last one survives. A target that
    /// fails is logged and recorded without stopping the batch.
    pub async fn self_correlation_batch(&self, alpha_ids: &[String], scope: TagScope) -> BatchScores {
        let (index, table) = self.load_universe(scope);
        let mut batch = BatchScores::default();
        for id in alpha_ids {
            match self
                .self_correlation(id, Some(&index), Some(&table), None)
                .await
            {
                Ok((score, _)) => batch.scores.push((id.clone(), score)),
                Err(e) => {
                    tracing::error!(alpha_id = %id, error = %e, "Could not score alpha.");
                    batch.failed.push((id.clone(), e.to_string()));
                }
            }
        }
        batch
    }

    pub fn report_path(&self) -> std::path::PathBuf {
        self.correlation.report_path()
    }
}
