use api_client::error::ApiError;
use api_client::{Channel, RawResponse};
use async_trait::async_trait;
use configuration::{Config, TagScope};
use database::{CacheStore, FsBlobStore};
use engine::{SyncMode, Workbench};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const BASE: &str = "http://brain.test";
const POWER_POOL: &str = "Power Pool Alpha";

/// A fake platform: alpha records, PnL record sets and the listing, all
/// routed by exact URL. Unknown URLs are 404s.
#[derive(Default)]
struct Platform {
    routes: Mutex<HashMap<String, String>>,
    listed: Mutex<Vec<serde_json::Value>>,
    requested: Mutex<Vec<String>>,
}

impl Platform {
    /// Publishes an alpha: its detail record, its PnL and a listing entry
    /// (newest first).
    fn publish(&self, id: &str, region: &str, tags: &[&str], pnl: &[f64]) {
        let classifications: Vec<_> = tags.iter().map(|t| json!({"name": t})).collect();
        let record = json!({
            "id": id,
            "stage": "OS",
            "settings": {"region": region},
            "classifications": classifications,
        });
        let records: Vec<_> = pnl
            .iter()
            .enumerate()
            .map(|(i, v)| json!([format!("2024-02-{:02}", i + 1), v]))
            .collect();
        let recordset = json!({
            "schema": {"properties": [{"name": "date"}, {"name": "pnl"}]},
            "records": records,
        });

        let mut routes = self.routes.lock().unwrap();
        routes.insert(format!("{}/alphas/{}", BASE, id), record.to_string());
        routes.insert(
            format!("{}/alphas/{}/recordsets/pnl", BASE, id),
            recordset.to_string(),
        );
        self.listed.lock().unwrap().insert(0, record);
    }

    /// Adds a detail record and PnL without listing the alpha (a candidate
    /// that is not submitted yet).
    fn candidate(&self, id: &str, region: &str, pnl: &[f64]) {
        self.publish(id, region, &[], pnl);
        self.listed.lock().unwrap().remove(0);
    }

    fn listing(&self, limit: usize, offset: usize) -> String {
        let listed = self.listed.lock().unwrap();
        let results: Vec<_> = listed.iter().skip(offset).take(limit).cloned().collect();
        json!({"count": listed.len(), "results": results}).to_string()
    }

    fn pnl_requests(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.ends_with("/recordsets/pnl"))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Channel for Platform {
    async fn get(&self, url: &str) -> Result<RawResponse, ApiError> {
        self.requested.lock().unwrap().push(url.to_string());
        let listing_prefix = format!("{}/users/self/alphas?stage=OS&limit=", BASE);
        if let Some(query) = url.strip_prefix(&listing_prefix) {
            let (limit, rest) = query.split_once("&offset=").unwrap();
            let (offset, _) = rest.split_once('&').unwrap();
            return Ok(RawResponse::new(
                200,
                self.listing(limit.parse().unwrap(), offset.parse().unwrap()),
            ));
        }
        Ok(match self.routes.lock().unwrap().get(url) {
            Some(body) => RawResponse::new(200, body.clone()),
            None => RawResponse::new(404, "not found"),
        })
    }
}

fn config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.api.base_url = BASE.to_string();
    config.fetcher.max_retries = 1;
    config.fetcher.max_rate_limit_polls = 1;
    config.retriever.workers = 4;
    config.catalog.page_size = 2;
    config.catalog.incremental_page_size = 2;
    config.cache.data_dir = dir.path().to_path_buf();
    config
}

fn usa_universe(platform: &Platform) {
    platform.publish("A", "USA", &[], &[0.0, 2.0, 1.0, 4.0, 4.5, 3.0]);
    platform.publish("B", "USA", &[POWER_POOL], &[0.0, 1.0, 3.0, 2.0, 6.0, 5.0]);
    platform.publish("C", "USA", &[], &[0.0, -1.0, 0.5, 0.0, -2.0, 1.0]);
}

fn saved_state(dir: &TempDir) -> database::CacheState {
    CacheStore::new(FsBlobStore::new(dir.path())).try_load().unwrap()
}

#[tokio::test(start_paused = true)]
async fn full_sync_pages_through_everything_and_saves() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    usa_universe(&platform);
    let workbench = Workbench::new(config(&dir), platform.clone());

    let summary = workbench.sync(SyncMode::Full).await.unwrap();

    assert_eq!(summary.new_alphas, 3);
    assert_eq!(summary.total_alphas, 3);
    assert!(summary.failed.is_empty());
    let state = saved_state(&dir);
    assert_eq!(state.table.width(), 3);
    assert!(state.index.is_consistent_with(&state.table));
    assert_eq!(state.partition_tags.iter().collect::<Vec<_>>(), ["B"]);
}

#[tokio::test(start_paused = true)]
async fn incremental_sync_only_fetches_new_alphas() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    usa_universe(&platform);
    let workbench = Workbench::new(config(&dir), platform.clone());
    workbench.sync(SyncMode::Incremental).await.unwrap();
    let before = platform.pnl_requests().len();

    platform.publish("E", "EUR", &[POWER_POOL], &[1.0, 2.0, 4.0]);
    let summary = workbench.sync(SyncMode::Incremental).await.unwrap();

    assert_eq!(summary.new_alphas, 1);
    assert_eq!(summary.total_alphas, 4);
    let fetched_now = &platform.pnl_requests()[before..];
    assert_eq!(fetched_now, [format!("{}/alphas/E/recordsets/pnl", BASE)]);
    let state = saved_state(&dir);
    // Listed newest first, so the first sync appended C, B, A.
    assert_eq!(state.table.columns(), ["C", "B", "A", "E"].map(String::from));
    assert!(state.partition_tags.contains("E"));

    let again = workbench.sync(SyncMode::Incremental).await.unwrap();
    assert_eq!(again.new_alphas, 0);
    assert_eq!(again.total_alphas, 4);
}

#[tokio::test(start_paused = true)]
async fn universe_can_be_scoped_by_tag() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    usa_universe(&platform);
    let workbench = Workbench::new(config(&dir), platform.clone());
    workbench.sync(SyncMode::Full).await.unwrap();

    let (tagged, tagged_table) = workbench.load_universe(TagScope::Tagged);
    let (untagged, untagged_table) = workbench.load_universe(TagScope::Untagged);
    let (all, all_table) = workbench.load_universe(TagScope::All);

    assert_eq!(tagged.ids().collect::<Vec<_>>(), ["B"]);
    assert_eq!(tagged_table.columns(), ["B".to_string()]);
    assert_eq!(untagged.ids().collect::<Vec<_>>(), ["C", "A"]);
    assert!(untagged.is_consistent_with(&untagged_table));
    assert_eq!(all.len(), 3);
    assert_eq!(all_table.width(), 3);
}

#[tokio::test(start_paused = true)]
async fn duplicate_of_a_cached_alpha_scores_one() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    usa_universe(&platform);
    // Same daily returns as B, shifted level.
    platform.candidate("D", "USA", &[7.0, 8.0, 10.0, 9.0, 13.0, 12.0]);
    let workbench = Workbench::new(config(&dir), platform.clone());
    workbench.sync(SyncMode::Full).await.unwrap();

    let batch = workbench
        .self_correlation_batch(&["D".to_string()], TagScope::All)
        .await;

    assert_eq!(batch.scores, [("D".to_string(), 1.0)]);
    assert!(batch.failed.is_empty());
    let report = std::fs::read_to_string(workbench.report_path()).unwrap();
    let mut lines = report.lines();
    assert_eq!(lines.next(), Some("alpha_id,correlation"));
    assert!(lines.next().unwrap().starts_with("B,1"));
    assert_eq!(lines.count(), 2);

    // B is out of scope for the untagged view, so the best match is weaker.
    let scoped = workbench
        .self_correlation_batch(&["D".to_string()], TagScope::Untagged)
        .await;
    assert!(scoped.scores[0].1 < 1.0);
}

#[tokio::test(start_paused = true)]
async fn cold_cache_scores_zero() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    platform.candidate("D", "USA", &[0.0, 1.0, 3.0, 2.0]);
    let workbench = Workbench::new(config(&dir), platform.clone());

    let (score, pnl) = workbench.self_correlation("D", None, None, None).await.unwrap();
    assert_eq!(score, 0.0);
    assert_eq!(pnl.points().len(), 4);

    let (index, table) = workbench.load_universe(TagScope::All);
    let (score, _) = workbench
        .self_correlation("D", Some(&index), Some(&table), Some(pnl))
        .await
        .unwrap();
    assert_eq!(score, 0.0);
    assert!(!workbench.report_path().exists());
}

#[tokio::test(start_paused = true)]
async fn unknown_target_is_an_error() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    let workbench = Workbench::new(config(&dir), platform);

    let err = workbench.self_correlation("nope", None, None, None).await.unwrap_err();
    assert!(matches!(err, engine::error::EngineError::ApiClient(_)));
}

#[tokio::test(start_paused = true)]
async fn batch_keeps_scoring_past_a_failing_target() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    usa_universe(&platform);
    platform.candidate("D", "USA", &[7.0, 8.0, 10.0, 9.0, 13.0, 12.0]);
    let workbench = Workbench::new(config(&dir), platform.clone());
    workbench.sync(SyncMode::Full).await.unwrap();

    let ids = ["nope", "D"].map(String::from);
    let batch = workbench.self_correlation_batch(&ids, TagScope::All).await;

    assert_eq!(batch.scores, [("D".to_string(), 1.0)]);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].0, "nope");
}

#[tokio::test(start_paused = true)]
async fn target_without_pnl_scores_zero() {
    let dir = TempDir::new().unwrap();
    let platform = Arc::new(Platform::default());
    usa_universe(&platform);
    platform.candidate("E", "USA", &[]);
    let workbench = Workbench::new(config(&dir), platform.clone());
    workbench.sync(SyncMode::Full).await.unwrap();

    let batch = workbench
        .self_correlation_batch(&["E".to_string()], TagScope::All)
        .await;

    assert_eq!(batch.scores, [("E".to_string(), 0.0)]);
    assert!(batch.failed.is_empty());
}
