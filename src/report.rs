use std::fmt::Write;

use serde::Serialize;
use tracing::warn;

use crate::abtest::{self, AbTestResult, Variance};
use crate::bayes;
use crate::error::AnalysisError;
use crate::models::{BucketScore, Dataset, DatasetOverview, RankedRecord};
use crate::summary;
use crate::wilson::{self, WilsonScorer};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub limit: usize,
    pub confidence: f64,
    pub positive_threshold: f64,
    pub min_count_fraction: f64,
    pub split_threshold: f64,
    pub alpha: f64,
    pub variance: Variance,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            confidence: wilson::DEFAULT_CONFIDENCE,
            positive_threshold: wilson::DEFAULT_POSITIVE_THRESHOLD,
            min_count_fraction: bayes::DEFAULT_MIN_COUNT_FRACTION,
            split_threshold: abtest::DEFAULT_SPLIT_THRESHOLD,
            alpha: abtest::DEFAULT_ALPHA,
            variance: Variance::Pooled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseReport {
    pub overview: DatasetOverview,
    pub bayesian: Vec<BucketScore>,
    pub top_courses: Vec<RankedRecord>,
    pub top_reviews: Vec<RankedRecord>,
    pub ab_test: Option<AbTestResult>,
    /// Set instead of `ab_test` when the comparison could not be run.
    pub ab_test_error: Option<String>,
}

pub fn build_report(dataset: &Dataset, options: &ReportOptions) -> Result<CourseReport, AnalysisError> {
    let overview = summary::overview(dataset)?;
    let bayesian = bayes::bayesian_scores(dataset, options.min_count_fraction)?;

    let scorer = WilsonScorer::new(options.confidence)?;
    let mut top_courses = wilson::rank_courses(dataset, &scorer, options.positive_threshold);
    top_courses.truncate(options.limit);
    let mut top_reviews = wilson::rank_reviews(dataset, &scorer);
    top_reviews.truncate(options.limit);

    let (ab_test, ab_test_error) = match abtest::compare_progress(
        dataset,
        options.split_threshold,
        options.alpha,
        options.variance,
    ) {
        Ok(result) => (Some(result), None),
        Err(err) => {
            warn!(error = %err, "skipping progress comparison");
            (None, Some(err.to_string()))
        }
    };

    Ok(CourseReport {
        overview,
        bayesian,
        top_courses,
        top_reviews,
        ab_test,
        ab_test_error,
    })
}

pub fn render_text(report: &CourseReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Course Rating Report");
    let _ = writeln!(output);
    output.push_str(&render_overview(&report.overview));

    let _ = writeln!(output);
    output.push_str(&render_bayesian(&report.bayesian));

    let _ = writeln!(output);
    output.push_str(&render_courses(&report.top_courses));

    let _ = writeln!(output);
    output.push_str(&render_reviews(&report.top_reviews));

    let _ = writeln!(output);
    match (&report.ab_test, &report.ab_test_error) {
        (Some(result), _) => output.push_str(&render_ab_test(result)),
        (None, Some(err)) => {
            let _ = writeln!(output, "## Progress A/B Test");
            let _ = writeln!(output, "Not run: {err}");
        }
        (None, None) => {}
    }

    output
}

pub fn render_overview(overview: &DatasetOverview) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "Reviews: {}", overview.record_count);
    let _ = writeln!(output, "Average course rating: {:.2}", overview.mean_rating);

    if let (Some(first), Some(last)) = (overview.first_review, overview.last_review) {
        let _ = writeln!(output, "Reviews from {first} to {last}");
    }
    if let Some(days) = overview.mean_days_enrolled {
        let _ = writeln!(output, "Average days from enrollment to review: {days:.1}");
    }

    let _ = writeln!(output, "Rating distribution:");
    for bucket in overview.distribution.iter() {
        let _ = writeln!(output, "- {}: {} reviews", bucket.rating, bucket.count);
    }

    output
}

pub fn render_bayesian(scores: &[BucketScore]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Bayesian Average Rating");
    if scores.is_empty() {
        let _ = writeln!(output, "No ratings recorded.");
    }
    for bucket in scores {
        let _ = writeln!(
            output,
            "- {}: {:.4} ({} reviews)",
            bucket.rating, bucket.score, bucket.count
        );
    }

    output
}

pub fn render_courses(ranked: &[RankedRecord]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Top Courses by Wilson Score");
    let _ = writeln!(output, "{:>6} {:>8} {:>12}", "row", "rating", "score");
    for record in ranked {
        let _ = writeln!(
            output,
            "{:>6} {:>8.1} {:>12.6}",
            record.row, record.rating, record.score
        );
    }

    output
}

pub fn render_reviews(ranked: &[RankedRecord]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Most Helpful Reviews");
    let _ = writeln!(
        output,
        "{:>6} {:>8} {:>8} {:>12}",
        "row", "rating", "helpful", "score"
    );
    for record in ranked {
        let _ = writeln!(
            output,
            "{:>6} {:>8.1} {:>8} {:>12.6}",
            record.row, record.rating, record.signal, record.score
        );
    }

    output
}

pub fn render_ab_test(result: &AbTestResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Progress A/B Test");
    let _ = writeln!(
        output,
        "Group A (rating >= {}): {} reviews, mean progress {:.2}",
        result.threshold, result.group_a.count, result.group_a.mean
    );
    let _ = writeln!(
        output,
        "Group B (rating < {}): {} reviews, mean progress {:.2}",
        result.threshold, result.group_b.count, result.group_b.mean
    );
    let _ = writeln!(output, "T statistic: {}", result.test.t_statistic);
    let _ = writeln!(output, "P value: {}", result.test.p_value);
    let _ = writeln!(output, "{}", result.verdict);

    output
}
