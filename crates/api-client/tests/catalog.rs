use api_client::fetcher::Fetcher;
use api_client::error::ApiError;
use api_client::{AlphaClient, Channel, RawResponse};
use async_trait::async_trait;
use configuration::FetcherSettings;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const BASE: &str = "http://brain.test";

/// Serves canned bodies by exact URL and records every request.
#[derive(Default)]
struct Routes {
    bodies: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl Routes {
    fn page(mut self, limit: usize, offset: usize, count: usize, ids: &[&str]) -> Self {
        let url = format!(
            "{}/users/self/alphas?stage=OS&limit={}&offset={}&order=-dateSubmitted",
            BASE, limit, offset
        );
        let results: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "stage": "OS", "settings": {"region": "USA"}}))
            .collect();
        self.bodies
            .insert(url, json!({"count": count, "results": results}).to_string());
        self
    }
}

#[async_trait]
impl Channel for Routes {
    async fn get(&self, url: &str) -> Result<RawResponse, ApiError> {
        self.requested.lock().unwrap().push(url.to_string());
        Ok(match self.bodies.get(url) {
            Some(body) => RawResponse::new(200, body.clone()),
            None => RawResponse::new(404, "not found"),
        })
    }
}

fn client(routes: Arc<Routes>) -> AlphaClient {
    let settings = FetcherSettings {
        max_retries: 1,
        max_rate_limit_polls: 1,
    };
    AlphaClient::new(Fetcher::new(routes, settings), BASE)
}

fn ids(alphas: &[core_types::Alpha]) -> Vec<&str> {
    alphas.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn pages_until_a_short_page() {
    let routes = Arc::new(
        Routes::default()
            .page(2, 0, 5, &["A", "B"])
            .page(2, 2, 5, &["C", "D"])
            .page(2, 4, 5, &["E"]),
    );

    let alphas = client(routes.clone())
        .list_alphas("OS", "-dateSubmitted", 2, false)
        .await
        .unwrap();

    assert_eq!(ids(&alphas), vec!["A", "B", "C", "D", "E"]);
    assert_eq!(routes.requested.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn incremental_poll_reads_only_the_first_page() {
    let routes = Arc::new(
        Routes::default()
            .page(2, 0, 5, &["A", "B"])
            .page(2, 2, 5, &["C", "D"]),
    );

    let alphas = client(routes.clone())
        .list_alphas("OS", "-dateSubmitted", 2, true)
        .await
        .unwrap();

    assert_eq!(ids(&alphas), vec!["A", "B"]);
    assert_eq!(routes.requested.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn result_is_truncated_to_the_declared_total() {
    // The listing shifted between pages, so the second page overlaps the first.
    let routes = Arc::new(
        Routes::default()
            .page(2, 0, 3, &["A", "B"])
            .page(2, 2, 3, &["B", "C"]),
    );

    let alphas = client(routes)
        .list_alphas("OS", "-dateSubmitted", 2, false)
        .await
        .unwrap();

    assert_eq!(ids(&alphas), vec!["A", "B", "B"]);
}

#[tokio::test(start_paused = true)]
async fn failing_listing_is_a_status_error() {
    let routes = Arc::new(Routes::default());
    let result = client(routes)
        .list_alphas("OS", "-dateSubmitted", 2, false)
        .await;
    assert!(matches!(result, Err(ApiError::Status { status: 404, .. })));
}
