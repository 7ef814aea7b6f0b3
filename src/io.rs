// Module for loading and writing the game data. It reads the csv file, validates headers, and coerces missing data.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RecommenderError, Result};

/// Columns a dataset must carry to be usable at all.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Title", "Genres", "Platforms"];

const DATE_FORMATS: [&str; 5] = ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y", "%d %b %Y"];

/// One CSV row exactly as the scraper writes it. Every cell is text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawGameRow {
    #[serde(rename = "URL", default)]          pub url: Option<String>,
    #[serde(rename = "Title")]                 pub title: String,
    #[serde(rename = "Metascore", default)]    pub metascore: Option<String>,
    #[serde(rename = "User Score", default)]   pub user_score: Option<String>,
    #[serde(rename = "Publisher", default)]    pub publisher: Option<String>,
    #[serde(rename = "Developers", default)]   pub developers: Option<String>,
    #[serde(rename = "Genres", default)]       pub genres: Option<String>,
    #[serde(rename = "Release Date", default)] pub release_date: Option<String>,
    #[serde(rename = "Platforms", default)]    pub platforms: Option<String>,
}

/// A typed game row. Numeric fields that failed to parse are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub title: String,
    pub metascore: Option<f64>,
    pub user_score: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub url: Option<String>,
    pub publisher: Option<String>,
    pub developers: Option<String>,
}

impl GameRecord {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

impl From<RawGameRow> for GameRecord {
    fn from(raw: RawGameRow) -> Self {
        GameRecord {
            title: raw.title.trim().to_string(),
            metascore: parse_score(raw.metascore.as_deref()),
            user_score: parse_score(raw.user_score.as_deref()),
            release_date: parse_release_date(raw.release_date.as_deref()),
            genres: split_tags(raw.genres.as_deref()),
            platforms: split_tags(raw.platforms.as_deref()),
            url: non_placeholder(raw.url),
            publisher: non_placeholder(raw.publisher),
            developers: non_placeholder(raw.developers),
        }
    }
}

/// The scraper writes this when a selector found nothing.
fn is_placeholder(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("not found")
}

fn non_placeholder(v: Option<String>) -> Option<String> {
    v.filter(|s| !is_placeholder(s)).map(|s| s.trim().to_string())
}

/// Parse a score cell; "tbd", "Not found", blanks and garbage become `None`.
pub fn parse_score(raw: Option<&str>) -> Option<f64> {
    let s = raw?.trim();
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Parse a release date in any of the formats the site has used. A bare year maps to January 1st.
pub fn parse_release_date(raw: Option<&str>) -> Option<NaiveDate> {
    let s = raw?.trim();
    if is_placeholder(s) {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if s.len() == 4 {
        if let Ok(year) = s.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }
    debug!("Unparseable release date '{}'", s);
    None
}

/// Split a comma-separated tag cell, trimming and dropping duplicates (first occurrence wins).
/// A malformed cell degrades to an empty tag set.
pub fn split_tags(raw: Option<&str>) -> Vec<String> {
    let Some(s) = raw else { return Vec::new() };
    if is_placeholder(s) {
        return Vec::new();
    }
    let mut tags: Vec<String> = Vec::new();
    for tag in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Load games from a CSV file on disk.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<GameRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = read_games(file)?;
    info!("Loaded {} games from {}", records.len(), path.display());
    Ok(records)
}

/// Read games from any CSV source. Fails with a data error if a required column is missing;
/// rows that are blank, ragged or undeserializable are skipped with a warning.
pub fn read_games<R: Read>(reader: R) -> Result<Vec<GameRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(RecommenderError::Data(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }
    let expected_len = headers.len();

    let mut out = Vec::new();
    for result in rdr.records() {
        let raw: StringRecord = result?;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);

        if raw.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        if raw.len() != expected_len {
            warn!(
                "Skipping line {}: expected {} fields, found {}",
                line,
                expected_len,
                raw.len()
            );
            continue;
        }

        match raw.deserialize::<RawGameRow>(Some(&headers)) {
            Ok(row) => out.push(GameRecord::from(row)),
            Err(e) => warn!("Skipping malformed record at line {}: {}", line, e),
        }
    }

    Ok(out)
}

/// Write scraped rows with the scraper's column layout. An empty batch writes nothing.
pub fn write_csv<P: AsRef<Path>>(rows: &[RawGameRow], path: P) -> Result<()> {
    let path = path.as_ref();
    if rows.is_empty() {
        warn!("No data to save to {}", path.display());
        return Ok(());
    }
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    info!("Saved {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
struct AnnotatedRow<'a> {
    #[serde(rename = "Title")]        title: &'a str,
    #[serde(rename = "Metascore")]    metascore: Option<f64>,
    #[serde(rename = "User Score")]   user_score: Option<f64>,
    #[serde(rename = "Release Date")] release_date: Option<String>,
    #[serde(rename = "Genres")]       genres: String,
    #[serde(rename = "Platforms")]    platforms: String,
    #[serde(rename = "Cluster")]      cluster: usize,
}

/// Write the typed dataset with each game's cluster id appended.
pub fn write_annotated_csv<P: AsRef<Path>>(
    records: &[GameRecord],
    labels: &[usize],
    path: P,
) -> Result<()> {
    if records.len() != labels.len() {
        return Err(RecommenderError::Data(format!(
            "{} records but {} cluster labels",
            records.len(),
            labels.len()
        )));
    }
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_path(path)?;
    for (rec, &cluster) in records.iter().zip(labels) {
        wtr.serialize(AnnotatedRow {
            title: &rec.title,
            metascore: rec.metascore,
            user_score: rec.user_score,
            release_date: rec.release_date.map(|d| d.format("%Y-%m-%d").to_string()),
            genres: rec.genres.join(", "),
            platforms: rec.platforms.join(", "),
            cluster,
        })?;
    }
    wtr.flush()?;
    info!("Exported {} clustered games to {}", records.len(), path.display());
    Ok(())
}
