use tracing::debug;

use crate::error::AnalysisError;
use crate::models::{BucketScore, Dataset};
use crate::summary;

pub const DEFAULT_MIN_COUNT_FRACTION: f64 = 0.10;

/// Global mean `C` and minimum count `m`, fixed for one averaging pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayesianParams {
    pub global_mean: f64,
    pub min_count: f64,
}

impl BayesianParams {
    pub fn from_dataset(dataset: &Dataset, min_count_fraction: f64) -> Result<Self, AnalysisError> {
        Ok(Self {
            global_mean: summary::mean_rating(dataset)?,
            min_count: dataset.len() as f64 * min_count_fraction,
        })
    }
}

/// `(n/(n+m))·R + (m/(n+m))·C`
pub fn bayesian_average(
    count: f64,
    rating: f64,
    params: &BayesianParams,
) -> Result<f64, AnalysisError> {
    let weight = count + params.min_count;
    if weight <= 0.0 {
        return Err(AnalysisError::ZeroWeight {
            count,
            min_count: params.min_count,
        });
    }
    Ok(count / weight * rating + params.min_count / weight * params.global_mean)
}

pub fn bayesian_scores(
    dataset: &Dataset,
    min_count_fraction: f64,
) -> Result<Vec<BucketScore>, AnalysisError> {
    let params = BayesianParams::from_dataset(dataset, min_count_fraction)?;
    debug!(
        global_mean = params.global_mean,
        min_count = params.min_count,
        "bayesian parameters"
    );

    summary::rating_distribution(dataset)
        .into_iter()
        .map(|bucket| {
            Ok(BucketScore {
                rating: bucket.rating,
                count: bucket.count,
                score: bayesian_average(bucket.count as f64, bucket.rating, &params)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::tests::dataset_of;

    fn params(global_mean: f64, min_count: f64) -> BayesianParams {
        BayesianParams {
            global_mean,
            min_count,
        }
    }

    #[test]
    fn four_row_scenario() {
        let scores = bayesian_scores(&dataset_of(&[5.0, 5.0, 3.0, 4.0]), 0.10).unwrap();
        let ratings: Vec<f64> = scores.iter().map(|s| s.rating).collect();
        assert_eq!(ratings, vec![3.0, 4.0, 5.0]);

        let five = &scores[2];
        assert_eq!(five.count, 2);
        let expected = (2.0 / 2.4) * 5.0 + (0.4 / 2.4) * 4.25;
        assert!((five.score - expected).abs() < 1e-12);
        assert!((five.score - 4.875).abs() < 1e-9);
    }

    #[test]
    fn params_are_shared_across_buckets() {
        let dataset = dataset_of(&[5.0, 5.0, 3.0, 4.0]);
        let params = BayesianParams::from_dataset(&dataset, 0.10).unwrap();
        let scores = bayesian_scores(&dataset, 0.10).unwrap();
        for bucket in scores {
            let direct = bayesian_average(bucket.count as f64, bucket.rating, &params).unwrap();
            assert_eq!(bucket.score, direct);
        }
    }

    #[test]
    fn estimate_stays_between_rating_and_mean() {
        for &(rating, mean) in &[(5.0, 3.2), (1.0, 4.4), (4.0, 4.0)] {
            for &count in &[0.0, 1.0, 7.0, 250.0] {
                for &m in &[0.0, 0.5, 12.0] {
                    if count + m == 0.0 {
                        continue;
                    }
                    let score = bayesian_average(count, rating, &params(mean, m)).unwrap();
                    let lo = f64::min(rating, mean);
                    let hi = f64::max(rating, mean);
                    assert!(score >= lo - 1e-12 && score <= hi + 1e-12);
                }
            }
        }
    }

    #[test]
    fn converges_to_rating_and_to_mean() {
        let p = params(3.0, 10.0);
        let many = bayesian_average(1e9, 5.0, &p).unwrap();
        assert!((many - 5.0).abs() < 1e-6);
        let none = bayesian_average(0.0, 5.0, &p).unwrap();
        assert!((none - 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_weight_is_rejected() {
        let err = bayesian_average(0.0, 4.0, &params(4.0, 0.0)).unwrap_err();
        assert!(matches!(err, AnalysisError::ZeroWeight { .. }));
    }

    #[test]
    fn empty_dataset_has_no_scores() {
        assert_eq!(
            bayesian_scores(&Default::default(), 0.10),
            Err(AnalysisError::EmptyDataset)
        );
    }
}
