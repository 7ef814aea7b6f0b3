use std::fs;
use std::path::PathBuf;

use game_recommender::io::load_csv;
use game_recommender::{RecommenderConfig, RecommenderError, Session};
use tempfile::TempDir;

const HEADER: &str = "URL,Title,Metascore,User Score,Publisher,Developers,Genres,Release Date,Platforms";

fn write_dataset(dir: &TempDir, rows: &[&str]) -> PathBuf {
    let path = dir.path().join("output.csv");
    let mut body = String::from(HEADER);
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    fs::write(&path, body).unwrap();
    path
}

fn trio(dir: &TempDir) -> PathBuf {
    write_dataset(
        dir,
        &[
            "https://www.metacritic.com/game/pc/alpha,Alpha Saga,91,8.9,Pub,Dev,\"RPG, Fantasy\",\"Oct 1, 2021\",\"PC, PS5\"",
            "https://www.metacritic.com/game/pc/beta,Beta Saga,90,8.8,Pub,Dev,\"RPG, Fantasy\",\"Oct 9, 2021\",\"PC, PS5\"",
            "https://www.metacritic.com/game/wii/kart,Kart Mania,52,3.9,Other,Other,Racing,\"Jun 2, 2007\",Wii",
        ],
    )
}

#[test]
fn load_train_recommend_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = trio(&dir);
    let mut session = Session::load(&path, RecommenderConfig::default()).unwrap();
    assert_eq!(session.matrix().nrows(), 3);

    let assignment = session.train(2).unwrap();
    let labels = assignment.labels().to_vec();
    assert_eq!(labels[0], labels[1]);
    assert_ne!(labels[0], labels[2]);

    let recs = session.recommend("alpha saga", 1).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "Beta Saga");
    assert!(recs[0].similarity > 90.0);
    assert!(recs[0].similarity <= 100.0);

    let anchor = session.find_game("ALPHA").unwrap();
    assert_eq!(anchor.title, "Alpha Saga");
}

#[test]
fn recommend_before_train_fails() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(trio(&dir), RecommenderConfig::default()).unwrap();
    assert!(matches!(
        session.recommend("Alpha", 5),
        Err(RecommenderError::ModelNotTrained)
    ));
    assert!(matches!(session.analyze(), Err(RecommenderError::ModelNotTrained)));
}

#[test]
fn unknown_title_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(trio(&dir), RecommenderConfig::default()).unwrap();
    session.train(2).unwrap();
    assert!(matches!(
        session.recommend("Halo", 5),
        Err(RecommenderError::NotFound(_))
    ));
}

#[test]
fn two_member_cluster_yields_one_result() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(trio(&dir), RecommenderConfig::default()).unwrap();
    session.train(2).unwrap();
    let recs = session.recommend("Beta", 5).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].title, "Alpha Saga");
}

#[test]
fn same_seed_reproduces_clusters() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(
        &dir,
        &[
            ",A,90,9.0,,,Action,\"Jan 1, 2020\",PC",
            ",B,85,8.1,,,Action,\"Jan 1, 2019\",PC",
            ",C,40,3.0,,,Puzzle,\"Jan 1, 2005\",DS",
            ",D,45,4.2,,,Puzzle,\"Jan 1, 2006\",DS",
            ",E,70,7.0,,,\"Action, Puzzle\",\"Jan 1, 2012\",\"PC, DS\"",
            ",F,tbd,tbd,,,Sports,,Switch",
        ],
    );
    let mut first = Session::load(&path, RecommenderConfig::default()).unwrap();
    let mut second = Session::load(&path, RecommenderConfig::default()).unwrap();
    let a = first.train(3).unwrap().labels().to_vec();
    let b = second.train(3).unwrap().labels().to_vec();
    assert_eq!(a, b);
    assert!(a.iter().all(|&c| c < 3));
}

#[test]
fn invalid_k_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(trio(&dir), RecommenderConfig::default()).unwrap();
    assert!(matches!(session.train(0), Err(RecommenderError::Config(_))));
    assert!(matches!(session.train(4), Err(RecommenderError::Config(_))));
    assert!(session.assignment().is_none());
}

#[test]
fn missing_columns_are_a_data_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "Title,Metascore\nA,90\n").unwrap();
    assert!(matches!(
        Session::load(&path, RecommenderConfig::default()),
        Err(RecommenderError::Data(_))
    ));
}

#[test]
fn analyze_covers_every_game() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(trio(&dir), RecommenderConfig::default()).unwrap();
    session.train(2).unwrap();
    let stats = session.analyze().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats.values().map(|s| s.size).sum::<usize>(), 3);

    let pair = stats.values().find(|s| s.size == 2).unwrap();
    assert_eq!(pair.avg_metascore, Some(90.5));
    assert_eq!(pair.avg_release_year, Some(2021.0));
    assert_eq!(pair.common_genres[0], ("RPG".to_string(), 2));
}

#[test]
fn export_appends_cluster_column() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(trio(&dir), RecommenderConfig::default()).unwrap();
    assert!(matches!(
        session.export(dir.path().join("early.csv")),
        Err(RecommenderError::ModelNotTrained)
    ));
    session.train(2).unwrap();

    let out = dir.path().join("clustered.csv");
    session.export(&out).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.ends_with(",Cluster"));

    let reloaded = load_csv(&out).unwrap();
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded[0].release_year(), Some(2021));
}

#[test]
fn oversized_score_precision_is_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let config = RecommenderConfig {
        score_precision: 400,
        ..Default::default()
    };
    assert!(matches!(
        Session::load(trio(&dir), config),
        Err(RecommenderError::Config(_))
    ));
}
