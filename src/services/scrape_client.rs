use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use scraper::{Html, Selector};
use url::Url;

use crate::domain::lead::{RawResult, SearchSource};

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Direct-scrape provider: fetches one listing page and treats each post on
/// it as a raw candidate. The search query is not used for fetching; the
/// extraction stage downstream does the filtering.
pub struct ScrapeClient {
    client: reqwest::Client,
    target_url: String,
}

impl ScrapeClient {
    pub fn new(target_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SCRAPE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        ScrapeClient { client, target_url }
    }

    fn extract_posts(html_content: &str, page_url: &str) -> Vec<RawResult> {
        let post_selector = Selector::parse(".post, .listing, .result").unwrap();
        let headline_selector = Selector::parse("h1, h2, h3, .title").unwrap();

        let html_document = Html::parse_document(html_content);

        html_document
            .select(&post_selector)
            .map(|post| {
                let title = post
                    .select(&headline_selector)
                    .next()
                    .map(|headline| headline.text().map(str::trim).join(" "))
                    .unwrap_or_default();

                let snippet = post
                    .text()
                    .map(str::trim)
                    .filter(|piece| !piece.is_empty())
                    .join(" ");

                RawResult {
                    title,
                    snippet,
                    url: page_url.to_string(),
                    source: SearchSource::Web,
                }
            })
            .collect()
    }
}

#[async_trait]
impl super::SearchProvider for ScrapeClient {
    async fn search(&self, _query: &str) -> Vec<RawResult> {
        if Url::parse(&self.target_url).is_err() {
            log::error!("Refusing to scrape invalid url: {}", self.target_url);
            return vec![];
        }

        let response = match self.client.get(&self.target_url).send().await {
            Ok(res) => res,
            Err(e) => {
                log::error!("Scraping failed for {}: {:?}", self.target_url, e);
                return vec![];
            }
        };

        let html_content = match response.error_for_status() {
            Ok(res) => match res.text().await {
                Ok(text) => text,
                Err(e) => {
                    log::error!("Failed to read page body from {}: {:?}", self.target_url, e);
                    return vec![];
                }
            },
            Err(e) => {
                log::error!("Scrape target returned error status: {:?}", e);
                return vec![];
            }
        };

        let posts = Self::extract_posts(&html_content, &self.target_url);
        log::info!("Scraped {} posts from {}", posts.len(), self.target_url);

        posts
    }
}
