use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::lead::{RawResult, SearchSource};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// B2B marketplaces worth pinning keyword searches to.
const B2B_SOURCES: [&str; 4] = ["smtnet.com", "alibaba.com", "globalsmt.net", "pcbmart.com"];

/// A source of raw lead candidates. Failures never cross this boundary:
/// an unreachable provider is an empty result set plus a logged error.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Vec<RawResult>;
}

/// The provider set one pipeline run queries, in list order.
pub struct SearchProviders {
    pub providers: Vec<Arc<dyn SearchProvider>>,
}

pub struct GoogleSearchClient {
    client: reqwest::Client,
    api_key: String,
    cx: String,
    url: String,
}

#[derive(Serialize)]
struct GoogleQuery {
    q: String,
    key: String,
    cx: String,
    num: u8,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Deserialize)]
struct GoogleItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

impl GoogleSearchClient {
    pub fn new(api_key: String, cx: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_default();

        GoogleSearchClient {
            client,
            api_key,
            cx,
            url: "https://www.googleapis.com/customsearch/v1".to_string(),
        }
    }

    /// Sharpen a plain intent into a buying-signal query pinned to known
    /// B2B sources.
    fn build_b2b_query(query: &str) -> String {
        let site_filter = B2B_SOURCES.iter().map(|site| format!("site:{}", site)).join(" OR ");
        format!(
            r#"{} ("wanted" OR "looking for" OR "contact supplier") {}"#,
            query, site_filter
        )
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(&self, query: &str) -> Vec<RawResult> {
        let query = GoogleQuery {
            q: Self::build_b2b_query(query),
            key: self.api_key.clone(),
            cx: self.cx.clone(),
            num: 10,
        };

        let response = match self.client.get(&self.url).query(&query).send().await {
            Ok(res) => res,
            Err(e) => {
                log::error!("Google search request failed: {:?}", e);
                return vec![];
            }
        };

        match response.error_for_status() {
            Ok(res) => match res.json::<GoogleResponse>().await {
                Ok(json) => json
                    .items
                    .into_iter()
                    .map(|item| RawResult {
                        title: item.title,
                        snippet: item.snippet,
                        url: item.link,
                        source: SearchSource::Web,
                    })
                    .collect(),
                Err(e) => {
                    log::error!("Error when deserializing google search response: {:?}", e);
                    vec![]
                }
            },
            Err(e) => {
                log::error!("Google search returned error status: {:?}", e);
                vec![]
            }
        }
    }
}

/// LLM-backed business database. Speaks a POST-a-query contract and returns
/// directory entries rather than web pages.
pub struct DirectorySearchClient {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

#[derive(Serialize)]
struct DirectoryQuery {
    query: String,
    #[serde(rename = "numResults")]
    num_results: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    data: Vec<DirectoryEntry>,
}

#[derive(Deserialize)]
struct DirectoryEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    additional_info: String,
    #[serde(default)]
    social_media_url: String,
}

impl DirectorySearchClient {
    pub fn new(api_key: String, url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_default();

        DirectorySearchClient {
            client,
            api_key,
            url,
        }
    }
}

#[async_trait]
impl SearchProvider for DirectorySearchClient {
    async fn search(&self, query: &str) -> Vec<RawResult> {
        let body = DirectoryQuery {
            query: query.to_string(),
            num_results: 2000,
            temperature: 0.1,
        };

        let response = match self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                log::error!("Directory search request failed: {:?}", e);
                return vec![];
            }
        };

        match response.error_for_status() {
            Ok(res) => match res.json::<DirectoryResponse>().await {
                Ok(json) => json
                    .data
                    .into_iter()
                    .map(|entry| RawResult {
                        title: entry.name,
                        snippet: entry.additional_info,
                        url: entry.social_media_url,
                        source: SearchSource::Directory,
                    })
                    .collect(),
                Err(e) => {
                    log::error!("Error when deserializing directory response: {:?}", e);
                    vec![]
                }
            },
            Err(e) => {
                log::error!("Directory search returned error status: {:?}", e);
                vec![]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GoogleSearchClient;

    #[test]
    fn b2b_query_carries_intent_terms_and_site_filters() {
        let query = GoogleSearchClient::build_b2b_query("FUJI AIMEX-II machines");

        assert!(query.starts_with("FUJI AIMEX-II machines"));
        assert!(query.contains(r#""wanted" OR "looking for" OR "contact supplier""#));
        assert!(query.contains("site:smtnet.com OR site:alibaba.com"));
    }
}
