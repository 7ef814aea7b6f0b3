// Per-cluster descriptive statistics for reporting.
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{RecommenderError, Result};
use crate::io::GameRecord;
use crate::model::ClusterAssignment;

/// How many of the most frequent genres/platforms to report per cluster.
pub const TOP_TAGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterStats {
    pub size: usize,
    pub avg_metascore: Option<f64>,
    pub avg_user_score: Option<f64>,
    pub avg_release_year: Option<f64>,
    pub common_genres: Vec<(String, usize)>,
    pub common_platforms: Vec<(String, usize)>,
}

/// Summarize every cluster id in `0..k`. Means skip missing values; an empty cluster
/// has size 0 and no means.
pub fn analyze(
    records: &[GameRecord],
    assignment: &ClusterAssignment,
    k: usize,
) -> Result<BTreeMap<usize, ClusterStats>> {
    if k != assignment.k() {
        return Err(RecommenderError::Config(format!(
            "analysis asked for {} clusters but the model has {}",
            k,
            assignment.k()
        )));
    }
    if records.len() != assignment.len() {
        return Err(RecommenderError::Data(format!(
            "{} records but {} cluster labels",
            records.len(),
            assignment.len()
        )));
    }

    let mut out = BTreeMap::new();
    for cluster in 0..k {
        let members: Vec<&GameRecord> = assignment
            .members(cluster)
            .into_iter()
            .map(|i| &records[i])
            .collect();

        out.insert(
            cluster,
            ClusterStats {
                size: members.len(),
                avg_metascore: mean(members.iter().filter_map(|r| r.metascore)),
                avg_user_score: mean(members.iter().filter_map(|r| r.user_score)),
                avg_release_year: mean(
                    members.iter().filter_map(|r| r.release_year()).map(f64::from),
                ),
                common_genres: most_common(members.iter().flat_map(|r| r.genres.iter()), TOP_TAGS),
                common_platforms: most_common(
                    members.iter().flat_map(|r| r.platforms.iter()),
                    TOP_TAGS,
                ),
            },
        );
    }
    Ok(out)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Top `n` tags by count; equal counts keep first-seen order.
pub fn most_common<'a>(tags: impl Iterator<Item = &'a String>, n: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut slot: HashMap<&'a str, usize> = HashMap::new();
    for tag in tags {
        match slot.get(tag.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slot.insert(tag.as_str(), counts.len());
                counts.push((tag.clone(), 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}
