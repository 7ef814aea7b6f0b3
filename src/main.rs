//! Command-line front end: load the scraped dataset, train, then recommend, analyze or export.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use plotters::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use game_recommender::analyze::ClusterStats;
use game_recommender::recommend::Recommendation;
use game_recommender::source::load_url_list;
use game_recommender::{RecommenderConfig, Session};

#[derive(Debug, Parser)]
#[command(name = "game-recommender", about = "Recommend similar games from scraped review data")]
struct Cli {
    /// CSV produced by the scraper (defaults to GAMEREC_DATA_PATH or output.csv)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Number of clusters
    #[arg(short = 'k', long, global = true)]
    clusters: Option<usize>,

    /// Seed for cluster initialization
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show games similar to TITLE
    Recommend {
        title: String,
        #[arg(short = 'n', long)]
        top_n: Option<usize>,
    },
    /// Print per-cluster statistics
    Analyze {
        /// Also draw cluster sizes to this PNG
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Write the dataset with a Cluster column
    Export { out: PathBuf },
    /// Check a file of URLs against the game page pattern
    CheckUrls { file: PathBuf },
}

impl Cli {
    fn apply(&self, mut cfg: RecommenderConfig) -> RecommenderConfig {
        if let Some(data) = &self.data {
            cfg.data_path = data.display().to_string();
        }
        if let Some(k) = self.clusters {
            cfg.clusters = k;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        cfg
    }
}

/// Draws a bar chart of cluster sizes and saves it as PNG
/// input: stats per cluster, output path
/// logic: one bar per cluster id, Y axis up to the largest cluster
fn plot_cluster_sizes(
    stats: &BTreeMap<usize, ClusterStats>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = stats.len();
    let max_size = stats.values().map(|s| s.size).max().unwrap_or(0);
    let y_max = max_size + max_size / 10 + 1;

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Games per Cluster", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..count, 0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .x_label_formatter(&|idx| {
            if *idx < count {
                format!("{}", idx)
            } else {
                String::new()
            }
        })
        .x_desc("Cluster")
        .y_desc("Games")
        .draw()?;

    chart.draw_series(stats.iter().map(|(&cluster, s)| {
        Rectangle::new([(cluster, 0), (cluster + 1, s.size)], BLUE.mix(0.5).filled())
    }))?;

    root.present()?;
    Ok(())
}

fn format_recommendation(rec: &Recommendation) -> String {
    let mut out = format!("\nTitle: {}\nSimilarity: {:.1}%\n", rec.title, rec.similarity);
    if let Some(score) = rec.metascore {
        out.push_str(&format!("Metascore: {}\n", score));
    }
    if !rec.genres.is_empty() {
        out.push_str(&format!("Genres: {}\n", rec.genres.join(", ")));
    }
    out.push_str(&"-".repeat(50));
    out
}

fn format_tags(tags: &[(String, usize)]) -> String {
    tags.iter()
        .map(|(t, n)| format!("{} ({})", t, n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "n/a".into())
}

fn open_trained_session(cfg: RecommenderConfig) -> anyhow::Result<Session> {
    let path = cfg.data_path.clone();
    let k = cfg.clusters;
    let mut session = Session::load(&path, cfg)
        .with_context(|| format!("failed to load dataset from {}", path))?;
    session.train(k).context("training failed")?;
    Ok(session)
}

/// load config, then dispatch the subcommand
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = cli.apply(RecommenderConfig::from_env()?);
    cfg.validate()?;

    match &cli.command {
        Command::Recommend { title, top_n } => {
            if title.trim().is_empty() {
                bail!("please enter a game title");
            }
            let session = open_trained_session(cfg)?;
            let top_n = top_n.unwrap_or(session.config().top_n);

            let game = session.find_game(title)?;
            println!("Details of the game you entered:");
            println!("Title: {}", game.title);
            println!("Metascore: {}", fmt_opt(game.metascore));
            println!("Genres: {}", game.genres.join(", "));

            let recs = session.recommend(title, top_n)?;
            if recs.is_empty() {
                println!("\nNo recommendations found.");
            }
            for rec in &recs {
                println!("{}", format_recommendation(rec));
            }
        }
        Command::Analyze { plot } => {
            let session = open_trained_session(cfg)?;
            let stats = session.analyze()?;
            println!("Cluster Analysis:");
            for (cluster, s) in &stats {
                println!("\nCluster {}:", cluster);
                println!("Size: {} games", s.size);
                println!("Average Metascore: {}", fmt_opt(s.avg_metascore));
                println!("Average User Score: {}", fmt_opt(s.avg_user_score));
                println!("Average Release Year: {}", fmt_opt(s.avg_release_year));
                println!("Most Common Genres: {}", format_tags(&s.common_genres));
                println!("Most Common Platforms: {}", format_tags(&s.common_platforms));
            }
            if let Some(path) = plot {
                plot_cluster_sizes(&stats, path)
                    .map_err(|e| anyhow::anyhow!("failed to plot: {}", e))?;
                info!("Wrote {}", path.display());
            }
        }
        Command::Export { out } => {
            let session = open_trained_session(cfg)?;
            session
                .export(out)
                .with_context(|| format!("failed to export to {}", out.display()))?;
            println!("Exported {} games to {}", session.records().len(), out.display());
        }
        Command::CheckUrls { file } => {
            let list = load_url_list(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            println!("{} valid, {} invalid", list.valid.len(), list.invalid.len());
            for url in &list.invalid {
                println!("invalid: {}", url);
            }
        }
    }

    Ok(())
}
