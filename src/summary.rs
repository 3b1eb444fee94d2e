use crate::error::AnalysisError;
use crate::models::{CourseReview, Dataset, DatasetOverview, RatingBucket};

pub fn mean_rating(dataset: &Dataset) -> Result<f64, AnalysisError> {
    if dataset.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }
    let total: f64 = dataset.records().iter().map(|r| r.rating).sum();
    Ok(total / dataset.len() as f64)
}

/// Counts per distinct rating value, ascending by rating.
pub fn rating_distribution(dataset: &Dataset) -> Vec<RatingBucket> {
    let mut ratings: Vec<f64> = dataset.records().iter().map(|r| r.rating).collect();
    ratings.sort_by(f64::total_cmp);

    let mut buckets: Vec<RatingBucket> = Vec::new();
    for rating in ratings {
        match buckets.last_mut() {
            Some(bucket) if bucket.rating == rating => bucket.count += 1,
            _ => buckets.push(RatingBucket { rating, count: 1 }),
        }
    }
    buckets
}

pub fn overview(dataset: &Dataset) -> Result<DatasetOverview, AnalysisError> {
    let mean_rating = mean_rating(dataset)?;
    let records = dataset.records();

    let first_review = records.iter().filter_map(|r| r.reviewed_at).min();
    let last_review = records.iter().filter_map(|r| r.reviewed_at).max();

    let spans: Vec<i64> = records
        .iter()
        .filter_map(CourseReview::days_enrolled_before_review)
        .collect();
    let mean_days_enrolled = if spans.is_empty() {
        None
    } else {
        Some(spans.iter().sum::<i64>() as f64 / spans.len() as f64)
    };

    Ok(DatasetOverview {
        record_count: dataset.len(),
        mean_rating,
        distribution: rating_distribution(dataset),
        first_review,
        last_review,
        mean_days_enrolled,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn review(rating: f64, progress: f64, asked: u32, answered: u32) -> CourseReview {
        CourseReview {
            rating,
            reviewed_at: None,
            enrolled_at: None,
            progress,
            questions_asked: asked,
            questions_answered: answered,
        }
    }

    pub(crate) fn dataset_of(ratings: &[f64]) -> Dataset {
        Dataset::new(ratings.iter().map(|&r| review(r, 50.0, 0, 0)).collect())
    }

    #[test]
    fn mean_of_sample_ratings() {
        let mean = mean_rating(&dataset_of(&[5.0, 5.0, 3.0, 4.0])).unwrap();
        assert!((mean - 4.25).abs() < 1e-12);
    }

    #[test]
    fn mean_of_empty_dataset_is_an_error() {
        assert_eq!(
            mean_rating(&Dataset::default()),
            Err(AnalysisError::EmptyDataset)
        );
    }

    #[test]
    fn distribution_groups_and_sorts() {
        let buckets = rating_distribution(&dataset_of(&[5.0, 3.0, 5.0, 4.5, 3.0, 5.0]));
        assert_eq!(
            buckets,
            vec![
                RatingBucket { rating: 3.0, count: 2 },
                RatingBucket { rating: 4.5, count: 1 },
                RatingBucket { rating: 5.0, count: 3 },
            ]
        );
    }

    #[test]
    fn overview_tracks_review_window() {
        let at = |day: u32| {
            NaiveDate::from_ymd_opt(2021, 2, day).and_then(|d| d.and_hms_opt(12, 0, 0))
        };
        let mut early = review(4.0, 10.0, 0, 0);
        early.reviewed_at = at(3);
        early.enrolled_at = at(1);
        let mut late = review(5.0, 90.0, 0, 0);
        late.reviewed_at = at(20);
        late.enrolled_at = at(10);
        let undated = review(3.0, 0.0, 0, 0);

        let summary = overview(&Dataset::new(vec![late, undated, early])).unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.first_review, at(3));
        assert_eq!(summary.last_review, at(20));
        assert_eq!(summary.mean_days_enrolled, Some(6.0));
        assert!((summary.mean_rating - 4.0).abs() < 1e-12);
    }
}
