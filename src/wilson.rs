//! Wilson score lower bound and the two per-record rankings built on it.
//!
//! See https://www.evanmiller.org/how-not-to-sort-by-average-rating.html

use std::cmp::Ordering;

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::AnalysisError;
use crate::models::{CourseReview, Dataset, RankedRecord};

pub const DEFAULT_CONFIDENCE: f64 = 0.95;
pub const DEFAULT_POSITIVE_THRESHOLD: f64 = 4.0;

/// Scorer with the normal quantile for its confidence level resolved once.
#[derive(Debug, Clone, Copy)]
pub struct WilsonScorer {
    confidence: f64,
    z: f64,
}

impl WilsonScorer {
    pub fn new(confidence: f64) -> Result<Self, AnalysisError> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(AnalysisError::InvalidConfidence(confidence));
        }
        let normal = Normal::new(0.0, 1.0)?;
        let z = normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
        Ok(Self { confidence, z })
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Lower bound of the Wilson interval for `pos` successes in `total` trials.
    ///
    /// Returns 0 when `total` is 0. `pos` is not clamped: a `pos / total`
    /// outside `[0, 1]` can drive the square root negative and yield NaN.
    pub fn lower_bound(&self, pos: f64, total: f64) -> f64 {
        if total == 0.0 {
            return 0.0;
        }
        let z2 = self.z * self.z;
        let phat = pos / total;
        let spread = ((phat * (1.0 - phat) + z2 / (4.0 * total)) / total).sqrt();
        (phat + z2 / (2.0 * total) - self.z * spread) / (1.0 + z2 / total)
    }
}

#[cfg(test)]
fn wilson_lower_bound(pos: f64, total: f64, confidence: f64) -> Result<f64, AnalysisError> {
    Ok(WilsonScorer::new(confidence)?.lower_bound(pos, total))
}

/// Each record is scored as its own one-trial sample: positive when the
/// rating reaches `positive_threshold`.
pub fn rank_courses(
    dataset: &Dataset,
    scorer: &WilsonScorer,
    positive_threshold: f64,
) -> Vec<RankedRecord> {
    rank_by(dataset, scorer, |review| {
        if review.is_positive(positive_threshold) {
            1.0
        } else {
            0.0
        }
    })
}

/// Each record is scored as a one-trial sample whose positive count is its
/// helpful delta (answers minus questions).
pub fn rank_reviews(dataset: &Dataset, scorer: &WilsonScorer) -> Vec<RankedRecord> {
    rank_by(dataset, scorer, |review| review.helpful_delta() as f64)
}

fn rank_by<F>(dataset: &Dataset, scorer: &WilsonScorer, signal_of: F) -> Vec<RankedRecord>
where
    F: Fn(&CourseReview) -> f64,
{
    let mut ranked: Vec<RankedRecord> = dataset
        .records()
        .iter()
        .enumerate()
        .map(|(row, review)| {
            let signal = signal_of(review);
            RankedRecord {
                row,
                rating: review.rating,
                signal,
                score: scorer.lower_bound(signal, 1.0),
            }
        })
        .collect();

    ranked.sort_by(|a, b| descending_nan_last(a.score, b.score));
    ranked
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
