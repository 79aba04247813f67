use crate::AlphaClient;
use crate::error::ApiError;
use crate::responses::{AlphaListResponse, ListQuery};
use core_types::Alpha;

impl AlphaClient {
    /// Pages through the caller's alphas in `stage`, newest first.
    ///
    /// The first page declares the total count, which bounds the loop. Paging
    /// stops on a short page, or after one page when `stop_at_first_page` is
    /// set (the incremental "what's new" poll). The result is truncated to the
    /// declared total in case pages overlapped while the listing was changing.
    pub async fn list_alphas(
        &self,
        stage: &str,
        order: &str,
        page_size: usize,
        stop_at_first_page: bool,
    ) -> Result<Vec<Alpha>, ApiError> {
        let mut fetched: Vec<Alpha> = Vec::new();
        let mut offset = 0;
        let mut total = page_size;

        while fetched.len() < total {
            tracing::info!(offset, limit = page_size, "Fetching alpha listing page.");
            let query = serde_qs::to_string(&ListQuery {
                stage,
                limit: page_size,
                offset,
                order,
            })?;
            let url = format!("{}/users/self/alphas?{}", self.base_url(), query);
            let page: AlphaListResponse = self.get_json(&url).await?;

            if offset == 0 {
                total = page.count;
            }
            let received = page.results.len();
            fetched.extend(page.results.into_iter().map(Alpha::from));

            if received < page_size || stop_at_first_page {
                break;
            }
            offset += page_size;
        }

        fetched.truncate(total);
        Ok(fetched)
    }
}
