//! Google results-page scraper: one fixed-shape request, best-effort
//! extraction of result URLs and an answer card.

pub mod card;

use std::fmt;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::warn;
use url::form_urlencoded;

pub use card::Card;

const SEARCH_URL: &str = "https://www.google.com/search";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.3; Win64; x64)";

/// The `search` section of the config file. Everything is optional.
#[derive(Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub user_agent: String,
    /// SafeSearch toggle, sent as `safe=on`/`safe=off`.
    pub safe: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            safe: true,
        }
    }
}

#[derive(Debug)]
pub enum SearchError {
    Http(reqwest::Error),
    /// Non-200 from the results endpoint.
    Status(reqwest::StatusCode),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "search request failed: {e}"),
            Self::Status(_) => write!(f, "Google somehow failed to respond."),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Status(_) => None,
        }
    }
}

/// What one search produced: maybe a card, plus the organic result URLs in
/// source order.
pub struct SearchResults {
    pub card: Option<Card>,
    pub entries: Vec<String>,
}

pub struct SearchClient {
    http: reqwest::Client,
    config: SearchConfig,
}

impl SearchClient {
    /// Build from the `search` config section, if the file has one.
    pub fn new(section: Option<&serde_json::Value>) -> Self {
        let config = match section {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                warn!("Ignoring bad search config section: {e}");
                SearchConfig::default()
            }),
            None => SearchConfig::default(),
        };
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn search(&self, query: &str) -> Result<SearchResults, SearchError> {
        let safe = if self.config.safe { "on" } else { "off" };
        let response = self
            .http
            .get(SEARCH_URL)
            .query(&[("q", query), ("safe", safe), ("lr", "lang_en"), ("hl", "en")])
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await
            .map_err(SearchError::Http)?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status()));
        }

        let body = response.text().await.map_err(SearchError::Http)?;
        Ok(parse_results_page(&body))
    }
}

/// Parse a results page. Pure; the seam the fixture tests go through.
pub fn parse_results_page(html: &str) -> SearchResults {
    let doc = Html::parse_document(html);
    SearchResults {
        card: card::parse_card(&doc),
        entries: extract_entries(&doc),
    }
}

/// Organic results point through `/url?q=<target>&...`; anything that
/// doesn't fit that shape is skipped, never fatal.
fn extract_entries(doc: &Html) -> Vec<String> {
    let result_sel = Selector::parse(r#"div[class="g"]"#).unwrap();
    let link_sel = Selector::parse("h3 > a").unwrap();

    let mut entries = Vec::new();
    for node in doc.select(&result_sel) {
        let Some(link) = node.select(&link_sel).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(query_string) = href.strip_prefix("/url?") else {
            continue;
        };
        let Some(target) = form_urlencoded::parse(query_string.as_bytes())
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned())
        else {
            continue;
        };
        entries.push(target);
    }
    entries
}
