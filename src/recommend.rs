// Similarity ranking inside the anchor game's cluster.
use ndarray::ArrayView1;
use serde::Serialize;
use tracing::debug;

use crate::config::MAX_SCORE_PRECISION;
use crate::error::{RecommenderError, Result};
use crate::io::GameRecord;
use crate::model::ClusterAssignment;
use crate::preprocess::FeatureMatrix;

/// A ranked suggestion. `similarity` is a percentage in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub similarity: f64,
    pub metascore: Option<f64>,
    pub genres: Vec<String>,
}

/// Index of the first game whose title contains `query`, ignoring case.
/// Several matches are not an error: dataset order decides.
pub fn find_anchor(records: &[GameRecord], query: &str) -> Result<usize> {
    let needle = query.to_lowercase();
    records
        .iter()
        .position(|r| r.title.to_lowercase().contains(&needle))
        .ok_or_else(|| RecommenderError::NotFound(query.to_string()))
}

/// Cosine similarity; 0 when either vector has zero length.
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}

/// Map a cosine similarity onto a rounded percentage clamped to [0, 100].
/// `precision` is capped at [`MAX_SCORE_PRECISION`] so the scale factor stays finite.
pub fn to_percentage(similarity: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_SCORE_PRECISION) as i32);
    let pct = (similarity.clamp(0.0, 1.0) * 100.0 * factor).round() / factor;
    pct.clamp(0.0, 100.0)
}

/// Recommend up to `top_n` games from the anchor's cluster, most similar first.
/// Ties keep dataset order. The anchor itself is never returned.
pub fn recommend(
    query: &str,
    matrix: &FeatureMatrix,
    assignment: &ClusterAssignment,
    records: &[GameRecord],
    top_n: usize,
    precision: u32,
) -> Result<Vec<Recommendation>> {
    if matrix.nrows() != records.len() || assignment.len() != records.len() {
        return Err(RecommenderError::Data(format!(
            "model is stale: {} records, {} feature rows, {} cluster labels",
            records.len(),
            matrix.nrows(),
            assignment.len()
        )));
    }

    let anchor = find_anchor(records, query)?;
    let cluster = assignment
        .cluster_of(anchor)
        .ok_or(RecommenderError::ModelNotTrained)?;
    let anchor_vec = matrix.row(anchor);

    let mut scored: Vec<(usize, f64)> = assignment
        .members(cluster)
        .into_iter()
        .filter(|&i| i != anchor)
        .map(|i| (i, cosine_similarity(anchor_vec, matrix.row(i))))
        .collect();
    // stable: equal scores stay in dataset order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_n);

    debug!(
        "Anchor '{}' (row {}) in cluster {}: {} candidates returned",
        records[anchor].title,
        anchor,
        cluster,
        scored.len()
    );

    Ok(scored
        .into_iter()
        .map(|(i, sim)| {
            let rec = &records[i];
            Recommendation {
                title: rec.title.clone(),
                similarity: to_percentage(sim, precision),
                metascore: rec.metascore,
                genres: rec.genres.clone(),
            }
        })
        .collect())
}
