// Feature construction: standardized numerics plus multi-hot genre/platform columns.
use std::collections::{BTreeSet, HashMap};

use ndarray::{Array2, ArrayView1};
use tracing::info;

use crate::error::{RecommenderError, Result};
use crate::io::GameRecord;

/// Names of the standardized numeric columns, in matrix order.
pub const NUMERIC_COLUMNS: [&str; 3] = ["metascore", "user_score", "release_year"];

/// Zero-mean, unit-variance scaling fitted on the full dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardizer {
    pub mean: f64,
    pub std: f64,
}

impl Standardizer {
    /// Population statistics. A constant column keeps a scale of 1 so it maps to 0.
    pub fn fit(values: &[f64]) -> Self {
        let n = values.len().max(1) as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        Standardizer {
            mean,
            std: if std > f64::EPSILON { std } else { 1.0 },
        }
    }

    pub fn transform(&self, v: f64) -> f64 {
        (v - self.mean) / self.std
    }
}

/// Sorted tag universe for one multi-valued attribute, keyed by tag string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagVocabulary {
    tags: Vec<String>,
    index: HashMap<String, usize>,
}

impl TagVocabulary {
    pub fn build<'a>(tag_sets: impl Iterator<Item = &'a [String]>) -> Self {
        let universe: BTreeSet<&str> = tag_sets
            .flat_map(|set| set.iter().map(String::as_str))
            .collect();
        let tags: Vec<String> = universe.into_iter().map(str::to_string).collect();
        let index = tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        TagVocabulary { tags, index }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn position(&self, tag: &str) -> Option<usize> {
        self.index.get(tag).copied()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// One feature vector per game, in dataset order. The column set is fixed at build time.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    values: Array2<f64>,
    columns: Vec<String>,
    scalers: [Standardizer; 3],
    genres: TagVocabulary,
    platforms: TagVocabulary,
}

impl FeatureMatrix {
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn scalers(&self) -> &[Standardizer; 3] {
        &self.scalers
    }

    pub fn genres(&self) -> &TagVocabulary {
        &self.genres
    }

    pub fn platforms(&self) -> &TagVocabulary {
        &self.platforms
    }
}

/// Build the feature matrix for a whole dataset.
///
/// Missing scores and years are filled with 0 *before* standardization, which pulls
/// games with missing data toward the low end of each scale rather than excluding them.
pub fn build(records: &[GameRecord]) -> Result<FeatureMatrix> {
    if records.is_empty() {
        return Err(RecommenderError::Data("dataset has no games".into()));
    }

    let raw_numeric: [Vec<f64>; 3] = [
        records.iter().map(|r| r.metascore.unwrap_or(0.0)).collect(),
        records.iter().map(|r| r.user_score.unwrap_or(0.0)).collect(),
        records
            .iter()
            .map(|r| r.release_year().map(f64::from).unwrap_or(0.0))
            .collect(),
    ];
    let scalers = [
        Standardizer::fit(&raw_numeric[0]),
        Standardizer::fit(&raw_numeric[1]),
        Standardizer::fit(&raw_numeric[2]),
    ];

    let genres = TagVocabulary::build(records.iter().map(|r| r.genres.as_slice()));
    let platforms = TagVocabulary::build(records.iter().map(|r| r.platforms.as_slice()));

    let n_numeric = NUMERIC_COLUMNS.len();
    let genre_offset = n_numeric;
    let platform_offset = genre_offset + genres.len();
    let ncols = platform_offset + platforms.len();

    let mut values = Array2::<f64>::zeros((records.len(), ncols));
    for (i, rec) in records.iter().enumerate() {
        for (j, scaler) in scalers.iter().enumerate() {
            values[(i, j)] = scaler.transform(raw_numeric[j][i]);
        }
        for tag in &rec.genres {
            if let Some(p) = genres.position(tag) {
                values[(i, genre_offset + p)] = 1.0;
            }
        }
        for tag in &rec.platforms {
            if let Some(p) = platforms.position(tag) {
                values[(i, platform_offset + p)] = 1.0;
            }
        }
    }

    let columns = NUMERIC_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(genres.tags().iter().map(|t| format!("genre:{}", t)))
        .chain(platforms.tags().iter().map(|t| format!("platform:{}", t)))
        .collect();

    info!(
        "Built feature matrix: {} games x {} columns ({} genres, {} platforms)",
        records.len(),
        ncols,
        genres.len(),
        platforms.len()
    );

    Ok(FeatureMatrix {
        values,
        columns,
        scalers,
        genres,
        platforms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn game(
        title: &str,
        meta: Option<f64>,
        user: Option<f64>,
        year: Option<i32>,
        genres: &[&str],
        platforms: &[&str],
    ) -> GameRecord {
        GameRecord {
            title: title.to_string(),
            metascore: meta,
            user_score: user,
            release_date: year.and_then(|y| NaiveDate::from_ymd_opt(y, 6, 1)),
            genres: genres.iter().map(|s| s.to_string()).collect(),
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            url: None,
            publisher: None,
            developers: None,
        }
    }

    fn sample() -> Vec<GameRecord> {
        vec![
            game("A", Some(90.0), Some(8.5), Some(2017), &["Action", "RPG"], &["PC"]),
            game("B", Some(70.0), None, Some(2020), &["Puzzle"], &["Switch", "PC"]),
            game("C", None, Some(6.0), None, &[], &["PS5"]),
            game("D", Some(60.0), Some(5.5), Some(2011), &["RPG"], &[]),
        ]
    }

    #[test]
    fn shape_and_columns_are_stable() {
        let recs = sample();
        let m1 = build(&recs).unwrap();
        let m2 = build(&recs).unwrap();
        assert_eq!(m1.nrows(), recs.len());
        // 3 numeric + Action, Puzzle, RPG + PC, PS5, Switch
        assert_eq!(m1.ncols(), 9);
        assert_eq!(m1.columns(), m2.columns());
        assert_eq!(m1.values(), m2.values());
        assert_eq!(m1.columns()[3], "genre:Action");
        assert_eq!(m1.columns()[6], "platform:PC");
    }

    #[test]
    fn numeric_columns_are_standardized() {
        let m = build(&sample()).unwrap();
        let n = m.nrows() as f64;
        for j in 0..NUMERIC_COLUMNS.len() {
            let col = m.values().column(j);
            let mean = col.sum() / n;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9, "column {} mean {}", j, mean);
            assert!((var - 1.0).abs() < 1e-9, "column {} var {}", j, var);
        }
    }

    #[test]
    fn missing_numeric_is_zero_before_scaling() {
        let m = build(&sample()).unwrap();
        let s = m.scalers()[0];
        // metascores were 90, 70, 0 (missing), 60
        assert!((s.mean - 55.0).abs() < 1e-9);
        assert!((m.row(2)[0] - s.transform(0.0)).abs() < 1e-12);
    }

    #[test]
    fn tags_are_multi_hot() {
        let m = build(&sample()).unwrap();
        let row = m.row(0);
        let action = 3 + m.genres().position("Action").unwrap();
        let rpg = 3 + m.genres().position("RPG").unwrap();
        let puzzle = 3 + m.genres().position("Puzzle").unwrap();
        assert_eq!(row[action], 1.0);
        assert_eq!(row[rpg], 1.0);
        assert_eq!(row[puzzle], 0.0);

        let pc = 3 + m.genres().len() + m.platforms().position("PC").unwrap();
        assert_eq!(m.row(1)[pc], 1.0);
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let recs = vec![
            game("A", Some(80.0), Some(8.0), Some(2020), &["Action"], &["PC"]),
            game("B", Some(80.0), Some(7.0), Some(2020), &["Action"], &["PC"]),
        ];
        let m = build(&recs).unwrap();
        assert_eq!(m.row(0)[0], 0.0);
        assert_eq!(m.row(1)[2], 0.0);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert!(matches!(build(&[]), Err(RecommenderError::Data(_))));
    }
}
