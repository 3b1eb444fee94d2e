use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::error::AnalysisError;
use crate::models::Dataset;

pub const DEFAULT_SPLIT_THRESHOLD: f64 = 4.5;
pub const DEFAULT_ALPHA: f64 = 0.05;

/// How the two sample variances are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variance {
    /// Student's test with a pooled variance estimate.
    #[default]
    Pooled,
    /// Welch's test; variances estimated separately.
    Welch,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTest {
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub variance: Variance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Significant,
    NotSignificant,
}

impl Verdict {
    pub fn from_p_value(p_value: f64, alpha: f64) -> Self {
        if p_value < alpha {
            Verdict::Significant
        } else {
            Verdict::NotSignificant
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Significant => write!(
                f,
                "Statistically significant difference between the groups (reject H0)"
            ),
            Verdict::NotSignificant => write!(
                f,
                "No significant difference between the groups (fail to reject H0)"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSummary {
    pub count: usize,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbTestResult {
    pub threshold: f64,
    pub alpha: f64,
    pub group_a: GroupSummary,
    pub group_b: GroupSummary,
    pub test: TTest,
    pub verdict: Verdict,
}

/// Progress values for ratings at or above `threshold` (A) and below it (B).
pub fn split_progress(dataset: &Dataset, threshold: f64) -> (Vec<f64>, Vec<f64>) {
    let (high, low): (Vec<_>, Vec<_>) = dataset
        .records()
        .iter()
        .partition(|r| r.rating >= threshold);
    (
        high.iter().map(|r| r.progress).collect(),
        low.iter().map(|r| r.progress).collect(),
    )
}

pub fn ttest_ind(a: &[f64], b: &[f64], variance: Variance) -> Result<TTest, AnalysisError> {
    let min = match variance {
        Variance::Pooled => 1,
        Variance::Welch => 2,
    };
    for (group, values) in [("A", a), ("B", b)] {
        if values.len() < min {
            return Err(AnalysisError::InsufficientData {
                group,
                got: values.len(),
                min,
            });
        }
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mean1, ss1) = mean_and_squares(a);
    let (mean2, ss2) = mean_and_squares(b);

    let (standard_error, degrees_of_freedom) = match variance {
        Variance::Pooled => {
            let df = n1 + n2 - 2.0;
            if df <= 0.0 {
                return Err(AnalysisError::InsufficientData {
                    group: "A+B",
                    got: a.len() + b.len(),
                    min: 3,
                });
            }
            let pooled = (ss1 + ss2) / df;
            ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
        }
        Variance::Welch => {
            let se1 = ss1 / (n1 - 1.0) / n1;
            let se2 = ss2 / (n2 - 1.0) / n2;
            let df = (se1 + se2).powi(2)
                / (se1.powi(2) / (n1 - 1.0) + se2.powi(2) / (n2 - 1.0));
            ((se1 + se2).sqrt(), df)
        }
    };

    if standard_error == 0.0 {
        // Constant groups: only equal means leave t undefined.
        if mean1 == mean2 {
            return Err(AnalysisError::ZeroVariance);
        }
        let t_statistic = if mean1 > mean2 {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        return Ok(TTest {
            t_statistic,
            p_value: 0.0,
            degrees_of_freedom,
            variance,
        });
    }

    let t_statistic = (mean1 - mean2) / standard_error;
    let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)?;
    let p_value = (2.0 * dist.sf(t_statistic.abs())).min(1.0);

    Ok(TTest {
        t_statistic,
        p_value,
        degrees_of_freedom,
        variance,
    })
}

pub fn compare_progress(
    dataset: &Dataset,
    threshold: f64,
    alpha: f64,
    variance: Variance,
) -> Result<AbTestResult, AnalysisError> {
    let (group_a, group_b) = split_progress(dataset, threshold);
    debug!(
        group_a = group_a.len(),
        group_b = group_b.len(),
        threshold,
        "split progress by rating"
    );

    let test = ttest_ind(&group_a, &group_b, variance)?;

    Ok(AbTestResult {
        threshold,
        alpha,
        group_a: summarize(&group_a),
        group_b: summarize(&group_b),
        test,
        verdict: Verdict::from_p_value(test.p_value, alpha),
    })
}

fn summarize(values: &[f64]) -> GroupSummary {
    GroupSummary {
        count: values.len(),
        mean: mean_and_squares(values).0,
    }
}

/// Mean and sum of squared deviations from it.
fn mean_and_squares(values: &[f64]) -> (f64, f64) {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let squares = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, squares)
}
