// The pieces of the scraper contract that need no network: which URLs are game pages,
// and reading URL lists from disk.
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::Result;

const GAME_URL_PATTERN: &str = r"^https?://www\.metacritic\.com/game/[^/]+/[^/]+";

fn game_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GAME_URL_PATTERN).expect("valid game url pattern"))
}

/// True for review-site game page URLs (`/game/<platform>/<slug>`).
pub fn is_game_url(url: &str) -> bool {
    game_url_regex().is_match(url.trim())
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UrlList {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
}

/// Read one URL per line, skipping blanks, and split into game URLs and the rest.
pub fn load_url_list<P: AsRef<Path>>(path: P) -> Result<UrlList> {
    let text = fs::read_to_string(path)?;
    Ok(partition_urls(text.lines()))
}

pub fn partition_urls<'a>(lines: impl Iterator<Item = &'a str>) -> UrlList {
    let mut list = UrlList::default();
    for url in lines.map(str::trim).filter(|l| !l.is_empty()) {
        if is_game_url(url) {
            list.valid.push(url.to_string());
        } else {
            warn!("Skipping invalid game URL: {}", url);
            list.invalid.push(url.to_string());
        }
    }
    list
}
