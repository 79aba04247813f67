//! # Bulk PnL Retriever
//!
//! Fetches the PnL of every alpha not yet cached, concurrently, and merges the
//! results into the wide table and the region index.
//!
//! - Alphas whose id is already a column are never fetched again.
//! - Fetches run in a bounded pool (`retriever.workers`). Each task owns its
//!   result; nothing shared is touched until every task has finished.
//! - A failing alpha is either skipped (logged, left out of both the index and
//!   the table) or aborts the batch, per `retriever.failure_policy`.

use crate::error::RetrieverError;
use api_client::AlphaClient;
use configuration::{FailurePolicy, RetrieverSettings};
use core_types::{Alpha, PnlSeries, PnlTable, RegionIndex};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;

pub mod error;

/// The merged state after a retrieval, plus what happened along the way.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOutcome {
    pub index: RegionIndex,
    pub table: PnlTable,
    /// Number of alphas whose PnL was fetched and merged.
    pub fetched: usize,
    /// `(alpha_id, error)` for every alpha skipped after a failed fetch.
    pub failed: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct PnlRetriever {
    client: AlphaClient,
    settings: RetrieverSettings,
}

impl PnlRetriever {
    pub fn new(client: AlphaClient, settings: RetrieverSettings) -> Self {
        Self { client, settings }
    }

    /// Brings `index`/`table` up to date with `alphas`.
    ///
    /// Inputs are taken by value and the merged state is returned; when there
    /// is nothing new they come back unchanged.
    pub async fn get_pnls(
        &self,
        alphas: &[Alpha],
        index: Option<RegionIndex>,
        table: Option<PnlTable>,
    ) -> Result<RetrievalOutcome, RetrieverError> {
        let mut index = index.unwrap_or_default();
        let table = table.unwrap_or_default();

        let mut seen = HashSet::new();
        let new_alphas: Vec<&Alpha> = alphas
            .iter()
            .filter(|a| !table.contains(&a.id) && seen.insert(a.id.as_str()))
            .collect();

        if new_alphas.is_empty() {
            tracing::debug!("No new alphas to fetch.");
            return Ok(RetrievalOutcome {
                index,
                table,
                fetched: 0,
                failed: Vec::new(),
            });
        }

        tracing::info!(
            new = new_alphas.len(),
            workers = self.settings.workers,
            "Fetching PnL for new alphas."
        );

        // `buffered` keeps input order, so new columns are appended in the
        // order the alphas were listed.
        let results: Vec<(&Alpha, Result<PnlSeries, _>)> = stream::iter(new_alphas)
            .map(|alpha| {
                let client = self.client.clone();
                async move { (alpha, client.pnl(&alpha.id).await) }
            })
            .buffered(self.settings.workers.max(1))
            .collect()
            .await;

        let mut merged = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for (alpha, result) in results {
            match result {
                Ok(series) => {
                    index.insert(alpha.region.clone(), alpha.id.clone());
                    merged.push(series);
                }
                Err(source) => match self.settings.failure_policy {
                    FailurePolicy::Abort => {
                        return Err(RetrieverError::Fetch {
                            alpha_id: alpha.id.clone(),
                            source,
                        });
                    }
                    FailurePolicy::Skip => {
                        tracing::error!(alpha_id = %alpha.id, error = %source, "Skipping alpha after failed PnL fetch.");
                        failed.push((alpha.id.clone(), source.to_string()));
                    }
                },
            }
        }

        let fetched = merged.len();
        let table = table.outer_join(merged);

        Ok(RetrievalOutcome {
            index,
            table,
            fetched,
            failed,
        })
    }

    /// The single-alpha path: fetches one PnL without touching any cache.
    pub async fn get_pnl(&self, alpha_id: &str) -> Result<PnlSeries, RetrieverError> {
        self.client
            .pnl(alpha_id)
            .await
            .map_err(|source| RetrieverError::Fetch {
                alpha_id: alpha_id.to_string(),
                source,
            })
    }
}
