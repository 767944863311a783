//! Outbound search dispatch and the per-tab search pipeline.
//!
//! The backend call is a single POST to `{base}/search`. Every failure mode
//! (transport error, non-2xx status, malformed body) is treated identically:
//! logged and masked with a synthetic result set. Searches never fail from
//! the caller's point of view.

use crate::config::AppConfig;
use crate::mock::{generate_mock_results, MOCK_RESULT_COUNT};
use crate::models::{ResultItem, SearchSettings, Tab, TabAttachment, TabId};
use crate::session::SessionService;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    settings: &'a SearchSettings,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<ResultItem>,
}

/// Client for the (optional) real search backend.
#[derive(Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    base_url: Option<String>,
}

impl SearchClient {
    pub fn new(config: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.search_api_url.clone(),
        }
    }

    /// Runs one search. Infallible by design: any backend problem degrades
    /// to the mock result set instead of surfacing an error.
    pub async fn search(
        &self,
        query: &str,
        attachment: Option<&TabAttachment>,
        settings: &SearchSettings,
    ) -> Vec<ResultItem> {
        // Nothing to search for
        if query.is_empty() && attachment.is_none() {
            return Vec::new();
        }

        match self.dispatch(query, attachment, settings).await {
            Ok(mut results) => {
                // Enforce rank ordering regardless of backend behavior
                results.sort_by_key(|r| r.rank);
                log::info!("Search returned {} results for: {}", results.len(), query);
                results
            }
            Err(e) => {
                log::warn!(
                    "Search request failed ({:#}), falling back to mock results",
                    e
                );
                generate_mock_results(MOCK_RESULT_COUNT)
            }
        }
    }

    async fn dispatch(
        &self,
        query: &str,
        attachment: Option<&TabAttachment>,
        settings: &SearchSettings,
    ) -> Result<Vec<ResultItem>> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow!("no search backend configured (offline mode)"))?;
        let url = format!("{}/search", base.trim_end_matches('/'));

        let request = match attachment {
            // File queries go up as multipart: query + settings + file part
            Some(file) => {
                let settings_json =
                    serde_json::to_string(settings).context("Failed to encode settings")?;
                let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type)
                    .context("Invalid attachment content type")?;
                let form = reqwest::multipart::Form::new()
                    .text("query", query.to_string())
                    .text("settings", settings_json)
                    .part("file", part);
                self.http.post(&url).multipart(form)
            }
            None => self.http.post(&url).json(&SearchRequest { query, settings }),
        };

        let response = request
            .send()
            .await
            .context("Search request failed")?
            .error_for_status()
            .context("Search backend returned an error status")?;

        let body: SearchResponse = response
            .json()
            .await
            .context("Malformed search response")?;

        Ok(body.results)
    }
}

/// Runs the search pipeline for one tab.
///
/// Marks the tab loading and clears its previous results, performs the call,
/// then applies the outcome. Each search carries the tab's sequence number;
/// if a newer search started or the tab was closed while this one was in
/// flight, the completion is discarded rather than overwriting newer state.
///
/// Returns the tab's state afterwards, or `None` for an unknown id.
pub async fn run_search(
    sessions: &SessionService,
    client: &SearchClient,
    tab_id: TabId,
) -> Option<Tab> {
    let snapshot = sessions.tab(tab_id)?;

    // An empty search is a no-op; loading state is left untouched
    if snapshot.query.is_empty() && snapshot.attachment.is_none() {
        log::debug!("Skipping empty search for tab {}", tab_id);
        return Some(snapshot);
    }

    let seq = sessions.begin_search(tab_id)?;
    log::info!("Searching for: {} (tab {})", snapshot.query, tab_id);

    let results = client
        .search(
            &snapshot.query,
            snapshot.attachment.as_ref(),
            &snapshot.settings,
        )
        .await;

    sessions.finish_search(tab_id, seq, results);
    sessions.tab(tab_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TabPatch;
    use axum::{routing::post, Json, Router};
    use std::net::SocketAddr;

    fn offline_client() -> SearchClient {
        SearchClient::new(&AppConfig::default())
    }

    fn unreachable_client() -> SearchClient {
        let config = AppConfig {
            // Reserved port, nothing listens there
            search_api_url: Some("http://127.0.0.1:1".to_string()),
            request_timeout_secs: 2,
            ..AppConfig::default()
        };
        SearchClient::new(&config)
    }

    fn canned_results() -> Vec<ResultItem> {
        use crate::models::MediaType;
        vec![
            ResultItem {
                id: "result_b".to_string(),
                rank: 2,
                media_type: MediaType::Image,
                title: "Image Result #2".to_string(),
                thumbnail_url: "https://example.com/2t.jpg".to_string(),
                full_url: "https://example.com/2f.jpg".to_string(),
                video_preview_url: None,
                start_time: None,
                end_time: None,
                source_video_id: Some("source_video_a".to_string()),
            },
            ResultItem {
                id: "result_a".to_string(),
                rank: 1,
                media_type: MediaType::Image,
                title: "Image Result #1".to_string(),
                thumbnail_url: "https://example.com/1t.jpg".to_string(),
                full_url: "https://example.com/1f.jpg".to_string(),
                video_preview_url: None,
                start_time: None,
                end_time: None,
                source_video_id: Some("source_video_a".to_string()),
            },
        ]
    }

    /// Serves canned results on an ephemeral port for the success path.
    async fn spawn_stub_backend(results: Vec<ResultItem>) -> String {
        let app = Router::new().route(
            "/search",
            post(move || {
                let results = results.clone();
                async move { Json(serde_json::json!({ "results": results })) }
            }),
        );

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_empty_query_no_file_yields_nothing() {
        let client = offline_client();
        let results = client.search("", None, &SearchSettings::default()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_offline_mode_falls_back_to_mock() {
        let client = offline_client();
        let results = client.search("cat", None, &SearchSettings::default()).await;
        assert_eq!(results.len(), MOCK_RESULT_COUNT);
        assert_eq!(results[0].rank, 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend_falls_back_to_mock() {
        let client = unreachable_client();
        let results = client.search("cat", None, &SearchSettings::default()).await;
        assert_eq!(results.len(), MOCK_RESULT_COUNT);
    }

    #[tokio::test]
    async fn test_success_path_resorts_by_rank() {
        let base = spawn_stub_backend(canned_results()).await;
        let config = AppConfig {
            search_api_url: Some(base),
            ..AppConfig::default()
        };
        let client = SearchClient::new(&config);

        let results = client.search("cat", None, &SearchSettings::default()).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert_eq!(results[0].id, "result_a");
    }

    #[tokio::test]
    async fn test_malformed_body_falls_back_to_mock() {
        // Backend answers 200 but without a `results` field
        let app = Router::new().route(
            "/search",
            post(|| async { Json(serde_json::json!({ "hits": [] })) }),
        );
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = AppConfig {
            search_api_url: Some(format!("http://{}", addr)),
            ..AppConfig::default()
        };
        let client = SearchClient::new(&config);

        let results = client.search("cat", None, &SearchSettings::default()).await;
        assert_eq!(results.len(), MOCK_RESULT_COUNT);
    }

    #[tokio::test]
    async fn test_run_search_end_to_end_with_fallback() {
        let sessions = SessionService::new(SearchSettings::default());
        let tab = sessions.create_tab();
        sessions.update_tab(
            tab.id,
            TabPatch {
                query: Some("cat".to_string()),
                ..Default::default()
            },
        );

        let client = unreachable_client();
        let after = run_search(&sessions, &client, tab.id).await.unwrap();

        assert!(!after.results.is_empty());
        assert!(!after.is_loading);
        // Rank-ordered, 1-based
        for (i, item) in after.results.iter().enumerate() {
            assert_eq!(item.rank, (i + 1) as u32);
        }
    }

    #[tokio::test]
    async fn test_run_search_empty_query_is_noop() {
        let sessions = SessionService::new(SearchSettings::default());
        let tab = sessions.create_tab();

        let client = offline_client();
        let after = run_search(&sessions, &client, tab.id).await.unwrap();
        assert!(after.results.is_empty());
        assert!(!after.is_loading);
    }

    #[tokio::test]
    async fn test_run_search_unknown_tab() {
        let sessions = SessionService::new(SearchSettings::default());
        let client = offline_client();
        assert!(run_search(&sessions, &client, TabId::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_run_search_discarded_after_close() {
        let sessions = SessionService::new(SearchSettings::default());
        let tab = sessions.create_tab();
        sessions.update_tab(
            tab.id,
            TabPatch {
                query: Some("cat".to_string()),
                ..Default::default()
            },
        );

        // Close while "in flight": the pipeline snapshot was taken, then the
        // tab disappears before the completion lands
        let snapshot = sessions.tab(tab.id).unwrap();
        let seq = sessions.begin_search(tab.id).unwrap();
        sessions.close_tab(tab.id);

        let client = unreachable_client();
        let results = client
            .search(&snapshot.query, None, &snapshot.settings)
            .await;
        assert!(!sessions.finish_search(tab.id, seq, results));
        assert!(sessions.tab(tab.id).is_none());
    }
}
