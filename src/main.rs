use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod abtest;
mod bayes;
mod error;
mod loader;
mod models;
mod report;
mod summary;
mod wilson;

use abtest::Variance;
use report::ReportOptions;

#[derive(Parser)]
#[command(name = "course-rating-stats")]
#[command(about = "Rating, ranking and A/B statistics for course reviews", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the dataset and preview its first rows
    Overview {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
    /// Bayesian average rating per rating value
    Bayes {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = bayes::DEFAULT_MIN_COUNT_FRACTION)]
        min_count_fraction: f64,
    },
    /// Rank courses by Wilson lower bound of rating positivity
    RankCourses {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = wilson::DEFAULT_CONFIDENCE)]
        confidence: f64,
        #[arg(long, default_value_t = wilson::DEFAULT_POSITIVE_THRESHOLD)]
        positive_threshold: f64,
    },
    /// Rank reviews by Wilson lower bound of answers minus questions
    RankReviews {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = wilson::DEFAULT_CONFIDENCE)]
        confidence: f64,
    },
    /// Compare progress between high and low rated reviews with a t-test
    AbTest {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = abtest::DEFAULT_SPLIT_THRESHOLD)]
        threshold: f64,
        #[arg(long, default_value_t = abtest::DEFAULT_ALPHA)]
        alpha: f64,
        /// Use Welch's unequal-variance test instead of the pooled test
        #[arg(long)]
        welch: bool,
    },
    /// Generate the full report
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn variance(welch: bool) -> Variance {
    if welch {
        Variance::Welch
    } else {
        Variance::Pooled
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Overview { csv, preview } => {
            let dataset = loader::load_csv(&csv)?;
            let overview = summary::overview(&dataset)?;
            print!("{}", report::render_overview(&overview));

            println!();
            println!("First {} reviews:", preview.min(dataset.len()));
            for (row, review) in dataset.records().iter().enumerate().take(preview) {
                println!(
                    "- [{row}] rating {} progress {} asked {} answered {}",
                    review.rating, review.progress, review.questions_asked, review.questions_answered
                );
            }
        }
        Commands::Bayes {
            csv,
            min_count_fraction,
        } => {
            let dataset = loader::load_csv(&csv)?;
            let scores = bayes::bayesian_scores(&dataset, min_count_fraction)?;
            print!("{}", report::render_bayesian(&scores));
        }
        Commands::RankCourses {
            csv,
            limit,
            confidence,
            positive_threshold,
        } => {
            let dataset = loader::load_csv(&csv)?;
            let scorer = wilson::WilsonScorer::new(confidence)?;
            debug!(z = scorer.z(), confidence = scorer.confidence(), "wilson scorer ready");
            let ranked = wilson::rank_courses(&dataset, &scorer, positive_threshold);
            let top: Vec<_> = ranked.into_iter().take(limit).collect();
            print!("{}", report::render_courses(&top));
        }
        Commands::RankReviews {
            csv,
            limit,
            confidence,
        } => {
            let dataset = loader::load_csv(&csv)?;
            let scorer = wilson::WilsonScorer::new(confidence)?;
            let ranked = wilson::rank_reviews(&dataset, &scorer);
            let top: Vec<_> = ranked.into_iter().take(limit).collect();
            print!("{}", report::render_reviews(&top));
        }
        Commands::AbTest {
            csv,
            threshold,
            alpha,
            welch,
        } => {
            let dataset = loader::load_csv(&csv)?;
            let result = abtest::compare_progress(&dataset, threshold, alpha, variance(welch))
                .context("progress comparison failed")?;
            print!("{}", report::render_ab_test(&result));
        }
        Commands::Report {
            csv,
            limit,
            format,
            out,
        } => {
            let dataset = loader::load_csv(&csv)?;
            let options = ReportOptions {
                limit,
                ..ReportOptions::default()
            };
            let built = report::build_report(&dataset, &options)?;
            let rendered = match format {
                Format::Text => report::render_text(&built),
                Format::Json => serde_json::to_string_pretty(&built)?,
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "report written");
                }
                None => print!("{rendered}"),
            }
        }
    }

    Ok(())
}
