//! RSS feed fetching and parsing
//!
//! Fetches feed XML over HTTP, walks it with quick-xml, and runs every item
//! title through the release-name parser so downstream reconciliation sees a
//! structured identity (or an explicit parse failure) per entry.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, info, warn};

use super::release_parser::{ParsedRelease, parse_release};

/// One feed entry with its extracted metadata
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub guid: Option<String>,
    pub title: String,
    pub link: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    /// Identity parsed from the title; `parsed.episode == None` means the
    /// name was unparseable
    pub parsed: ParsedRelease,
}

/// RSS service for fetching and parsing feeds
pub struct RssService {
    client: Client,
}

impl RssService {
    /// Create a new RSS service
    pub fn new(user_agent: &str) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch and parse an RSS feed from a URL
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<FeedItem>> {
        info!("Fetching RSS feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch RSS feed")?;

        if !response.status().is_success() {
            anyhow::bail!("RSS feed returned error status: {}", response.status());
        }

        let content = response
            .text()
            .await
            .context("Failed to read RSS feed content")?;

        self.parse_feed(&content)
    }

    /// Parse RSS XML content into items
    pub fn parse_feed(&self, content: &str) -> Result<Vec<FeedItem>> {
        use quick_xml::Reader;
        use quick_xml::events::Event;

        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut items = Vec::new();
        let mut current_item: Option<FeedItemBuilder> = None;
        let mut current_tag = String::new();
        let mut in_item = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    current_tag = tag_name.clone();

                    if tag_name == "item" {
                        in_item = true;
                        current_item = Some(FeedItemBuilder::default());
                    }
                }
                Ok(Event::End(ref e)) => {
                    let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if tag_name == "item" {
                        in_item = false;
                        if let Some(builder) = current_item.take()
                            && let Some(item) = Self::build_item(builder)
                        {
                            items.push(item);
                        }
                    }
                    current_tag.clear();
                }
                Ok(Event::Text(ref e)) => {
                    if in_item
                        && let Some(ref mut builder) = current_item
                    {
                        let text = e.unescape().unwrap_or_default().to_string();
                        match current_tag.as_str() {
                            "title" => builder.title = Some(text),
                            "link" => builder.link = Some(text),
                            "guid" => builder.guid = Some(text),
                            "pubDate" => builder.pub_date = Some(text),
                            "description" => builder.description = Some(text),
                            _ => {}
                        }
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if in_item
                        && let Some(ref mut builder) = current_item
                    {
                        let text = String::from_utf8_lossy(e.as_ref()).to_string();
                        match current_tag.as_str() {
                            "title" => builder.title = Some(text),
                            "description" => builder.description = Some(text),
                            _ => {}
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    warn!("Error parsing RSS XML: {:?}", e);
                    break;
                }
                _ => {}
            }
        }

        info!("Parsed {} items from RSS feed", items.len());
        Ok(items)
    }

    /// Build a feed item from the builder
    fn build_item(builder: FeedItemBuilder) -> Option<FeedItem> {
        let title = builder.title?;
        let link = builder.link?;

        let parsed = parse_release(&title);
        let pub_date = builder.pub_date.and_then(|s| Self::parse_rss_date(&s));

        Some(FeedItem {
            guid: builder.guid,
            title,
            link,
            pub_date,
            description: builder.description,
            parsed,
        })
    }

    /// Parse RSS date format (RFC 2822)
    fn parse_rss_date(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.with_timezone(&Utc));
        }

        let formats = [
            "%a, %d %b %Y %H:%M:%S %z",
            "%Y-%m-%dT%H:%M:%S%z",
            "%Y-%m-%d %H:%M:%S",
        ];

        for fmt in formats {
            if let Ok(dt) = chrono::DateTime::parse_from_str(s, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.and_utc());
            }
        }

        debug!("Failed to parse RSS date: {}", s);
        None
    }
}

/// Builder for feed items during parsing
#[derive(Default)]
struct FeedItemBuilder {
    guid: Option<String>,
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
}
