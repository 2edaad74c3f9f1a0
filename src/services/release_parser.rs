//! Release-name parser for feed entry titles
//!
//! Parses names like:
//! - "[SubsPlease] Frieren - 28 (1080p) [ABCD1234].mkv"
//! - "[Group] Show Title S2 - 05 [720p].mkv"
//! - "Chicago Fire S14E08 1080p WEB h264-ETHEL"
//! - "Corner Gas 6x12 HDTV"
//!
//! Parsing is best-effort and never fails: a name the grammar cannot handle
//! yields a [`ParsedRelease`] with `episode = None`, which is the sole
//! parse-failure signal callers consume.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Structured identity extracted from a release's display name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedRelease {
    pub title: Option<String>,
    pub season: Option<u32>,
    /// Absent when the name could not be parsed
    pub episode: Option<u32>,
    pub group: Option<String>,
    pub resolution: Option<String>,
    pub original_name: String,
}

impl ParsedRelease {
    /// Whether the name yielded enough identity to compare against others
    pub fn is_parseable(&self) -> bool {
        self.episode.is_some()
    }
}

/// Parse a release display name into a structured identity
pub fn parse_release(name: &str) -> ParsedRelease {
    let mut result = ParsedRelease {
        original_name: name.to_string(),
        ..Default::default()
    };

    // Peel off a leading [Group] tag (fansub convention) before anything else
    let group_re = Regex::new(r"^\[([^\]]+)\]\s*").unwrap();
    let mut remainder = name.to_string();
    if let Some(caps) = group_re.captures(&remainder) {
        result.group = Some(caps.get(1).unwrap().as_str().trim().to_string());
        remainder = group_re.replace(&remainder, "").to_string();
    }

    // Drop the container extension
    let ext_re = Regex::new(r"(?i)\.(mkv|mp4|avi|ts|webm|torrent)$").unwrap();
    remainder = ext_re.replace(&remainder, "").to_string();

    // Try patterns in order of specificity

    // Pattern 1: S01E01 format (scene style)
    let sxxexx_re = Regex::new(r"(?i)^(.+?)[\s._]*S(\d{1,2})[\s._]*E(\d{1,3})").unwrap();
    // Pattern 2: 1x01 format
    let nxnn_re = Regex::new(r"(?i)^(.+?)[\s._]+(\d{1,2})x(\d{2,3})").unwrap();
    // Pattern 3: verbose "Episode 12" / "Ep 12"
    let verbose_re = Regex::new(r"(?i)^(.+?)\s+(?:Episode|Ep)\s*\.?\s*(\d{1,3})\b").unwrap();
    // Pattern 4: spaced-dash anime style "Title - 01" (optionally "Title S2 - 01")
    let dash_re = Regex::new(r"^(.+?)\s+-\s+(\d{1,3})(?:[vV]\d+)?\b").unwrap();

    if let Some(caps) = sxxexx_re.captures(&remainder) {
        result.title = Some(clean_title_fragment(caps.get(1).unwrap().as_str()));
        result.season = caps.get(2).and_then(|m| m.as_str().parse().ok());
        result.episode = caps.get(3).and_then(|m| m.as_str().parse().ok());
    } else if let Some(caps) = nxnn_re.captures(&remainder) {
        result.title = Some(clean_title_fragment(caps.get(1).unwrap().as_str()));
        result.season = caps.get(2).and_then(|m| m.as_str().parse().ok());
        result.episode = caps.get(3).and_then(|m| m.as_str().parse().ok());
    } else if let Some(caps) = verbose_re.captures(&remainder) {
        result.title = Some(clean_title_fragment(caps.get(1).unwrap().as_str()));
        result.episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
    } else if let Some(caps) = dash_re.captures(&remainder) {
        result.title = Some(clean_title_fragment(caps.get(1).unwrap().as_str()));
        result.episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
    }

    // Season hints carried inside the title fragment ("S2", "Season 2",
    // "2nd Season") — common in anime names that use the dash style
    if let Some(title) = result.title.clone() {
        let season_re =
            Regex::new(r"(?i)\s+(?:S(\d{1,2})|Season\s*(\d{1,2})|(\d{1,2})(?:st|nd|rd|th)\s+Season)\s*$")
                .unwrap();
        if let Some(caps) = season_re.captures(&title) {
            if result.season.is_none() {
                result.season = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .and_then(|m| m.as_str().parse().ok());
            }
            result.title = Some(season_re.replace(&title, "").trim().to_string());
        }
    }

    // Resolution, wherever it appears in the name
    let res_re = Regex::new(r"(?i)\b(2160p|1080p|720p|480p|4K|UHD)\b").unwrap();
    if let Some(caps) = res_re.captures(name) {
        let res = caps.get(1).unwrap().as_str().to_uppercase();
        result.resolution = Some(match res.as_str() {
            "4K" | "UHD" => "2160p".to_string(),
            other => other.to_lowercase(),
        });
    }

    // Scene-style trailing group (only when no leading [Group] tag was found);
    // requires a letter so " - 01" never reads as a group
    if result.group.is_none() {
        let tail_group_re =
            Regex::new(r"-([A-Za-z0-9]*[A-Za-z][A-Za-z0-9]*)(?:\.[A-Za-z0-9]+)?$").unwrap();
        if let Some(caps) = tail_group_re.captures(name) {
            result.group = Some(caps.get(1).unwrap().as_str().to_string());
        }
    }

    debug!(
        name = name,
        title = ?result.title,
        season = ?result.season,
        episode = ?result.episode,
        group = ?result.group,
        resolution = ?result.resolution,
        "Parsed release name"
    );

    result
}

/// Clean up a title fragment captured ahead of the episode marker
fn clean_title_fragment(fragment: &str) -> String {
    let mut cleaned = fragment.replace('.', " ").replace('_', " ");

    // Strip leftover bracketed or parenthesized tags
    let tag_re = Regex::new(r"[\[(][^\])]*[\])]").unwrap();
    cleaned = tag_re.replace_all(&cleaned, " ").to_string();

    let space_re = Regex::new(r"\s+").unwrap();
    cleaned = space_re.replace_all(&cleaned, " ").to_string();

    cleaned.trim().trim_end_matches('-').trim().to_string()
}

/// Normalize a title for series lookup (case, articles, punctuation)
pub fn normalize_title(title: &str) -> String {
    let mut normalized = title.to_lowercase();

    for article in ["the ", "a ", "an "] {
        if normalized.starts_with(article) {
            normalized = normalized[article.len()..].to_string();
        }
    }

    let special_re = Regex::new(r"[^a-z0-9\s]").unwrap();
    normalized = special_re.replace_all(&normalized, "").to_string();

    let space_re = Regex::new(r"\s+").unwrap();
    normalized = space_re.replace_all(&normalized, " ").to_string();

    normalized.trim().to_string()
}
