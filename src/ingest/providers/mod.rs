// src/ingest/providers/mod.rs
pub mod html_list;
pub mod rss;

use crate::error::FetchError;
use crate::ingest::registry::{FetchKind, ResolvedSource};
use crate::ingest::types::SourceProvider;

pub use html_list::HtmlListProvider;
pub use rss::RssProvider;

/// GET `url` and return the body. Any non-2xx status is a failure.
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    resp.text().await.map_err(FetchError::from_reqwest)
}

/// Shared HTTP client for source fetches; `timeout` bounds every request.
pub fn http_client(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(timeout.min(std::time::Duration::from_secs(5)))
        .timeout(timeout)
        .user_agent(concat!("phd-radar/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Build one HTTP-backed provider per resolved fetch.
pub fn build_providers(
    sources: &[ResolvedSource],
    client: &reqwest::Client,
    listing_terms: &[String],
) -> Vec<Box<dyn SourceProvider>> {
    sources
        .iter()
        .map(|s| -> Box<dyn SourceProvider> {
            match s.kind {
                FetchKind::Feed => Box::new(RssProvider::from_url(
                    s.meta.clone(),
                    &s.url,
                    client.clone(),
                )),
                FetchKind::HtmlList => Box::new(HtmlListProvider::from_url(
                    s.meta.clone(),
                    &s.url,
                    client.clone(),
                    listing_terms,
                )),
            }
        })
        .collect()
}
