use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseReview {
    pub rating: f64,
    pub reviewed_at: Option<NaiveDateTime>,
    pub enrolled_at: Option<NaiveDateTime>,
    pub progress: f64,
    pub questions_asked: u32,
    pub questions_answered: u32,
}

impl CourseReview {
    pub fn is_positive(&self, threshold: f64) -> bool {
        self.rating >= threshold
    }

    /// Answers given minus questions asked; negative for net askers.
    pub fn helpful_delta(&self) -> i64 {
        i64::from(self.questions_answered) - i64::from(self.questions_asked)
    }

    pub fn days_enrolled_before_review(&self) -> Option<i64> {
        match (self.enrolled_at, self.reviewed_at) {
            (Some(enrolled), Some(reviewed)) => Some((reviewed - enrolled).num_days()),
            _ => None,
        }
    }
}

/// Reviews in file order. Never mutated after loading; derived scores live in
/// separate projections.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CourseReview>,
}

impl Dataset {
    pub fn new(records: Vec<CourseReview>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CourseReview] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketScore {
    pub rating: f64,
    pub count: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRecord {
    /// Zero-based position of the record in the loaded file.
    pub row: usize,
    pub rating: f64,
    /// The value fed to the scorer as the positive count.
    pub signal: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetOverview {
    pub record_count: usize,
    pub mean_rating: f64,
    pub distribution: Vec<RatingBucket>,
    pub first_review: Option<NaiveDateTime>,
    pub last_review: Option<NaiveDateTime>,
    pub mean_days_enrolled: Option<f64>,
}
