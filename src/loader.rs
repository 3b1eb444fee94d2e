use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::models::{CourseReview, Dataset};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Rating")]
    rating: f64,
    #[serde(rename = "Timestamp", default)]
    timestamp: Option<String>,
    #[serde(rename = "Enrolled", default)]
    enrolled: Option<String>,
    #[serde(rename = "Progress")]
    progress: f64,
    #[serde(rename = "Questions Asked")]
    questions_asked: f64,
    #[serde(rename = "Questions Answered")]
    questions_answered: f64,
}

pub fn load_csv(csv_path: &Path) -> anyhow::Result<Dataset> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let dataset =
        load_reader(file).with_context(|| format!("failed to load {}", csv_path.display()))?;
    info!(records = dataset.len(), path = %csv_path.display(), "loaded course reviews");
    Ok(dataset)
}

pub fn load_reader<R: Read>(input: R) -> anyhow::Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1, so data row `index` sits on line index + 2.
        let line = index + 2;
        let row = result.with_context(|| format!("malformed row on line {line}"))?;
        let record = convert_row(row).with_context(|| format!("invalid row on line {line}"))?;
        records.push(record);
    }

    debug!(records = records.len(), "parsed csv rows");
    Ok(Dataset::new(records))
}

fn convert_row(row: CsvRow) -> anyhow::Result<CourseReview> {
    if !row.rating.is_finite() {
        bail!("Rating must be a finite number, got {}", row.rating);
    }
    if !row.progress.is_finite() {
        bail!("Progress must be a finite number, got {}", row.progress);
    }

    Ok(CourseReview {
        rating: row.rating,
        reviewed_at: parse_timestamp(row.timestamp.as_deref()).context("bad Timestamp")?,
        enrolled_at: parse_timestamp(row.enrolled.as_deref()).context("bad Enrolled")?,
        progress: row.progress,
        questions_asked: whole_count("Questions Asked", row.questions_asked)?,
        questions_answered: whole_count("Questions Answered", row.questions_answered)?,
    })
}

fn whole_count(column: &str, value: f64) -> anyhow::Result<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        bail!("{column} must be a non-negative whole number, got {value}");
    }
    Ok(value as u32)
}

fn parse_timestamp(raw: Option<&str>) -> anyhow::Result<Option<NaiveDateTime>> {
    let value = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };

    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, DATETIME_FORMAT) {
        return Ok(Some(parsed));
    }

    let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("unrecognized timestamp {value:?}"))?;
    Ok(date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Rating,Timestamp,Enrolled,Progress,Questions Asked,Questions Answered
5.0,2021-02-05 07:45:55,2021-01-25 15:12:08,5.0,0.0,0.0
4.5,2021-02-04 21:05:32,2021-02-04 20:43:40,1.0,2.0,3.0
3.0,,2020-12-01,45.0,1,0
";

    #[test]
    fn loads_rows_in_file_order() {
        let dataset = load_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let ratings: Vec<f64> = dataset.records().iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![5.0, 4.5, 3.0]);

        let second = &dataset.records()[1];
        assert_eq!(second.questions_asked, 2);
        assert_eq!(second.questions_answered, 3);
        assert_eq!(second.helpful_delta(), 1);
    }

    #[test]
    fn parses_datetimes_and_bare_dates() {
        let dataset = load_reader(SAMPLE.as_bytes()).unwrap();
        let first = &dataset.records()[0];
        assert_eq!(first.days_enrolled_before_review(), Some(10));

        let third = &dataset.records()[2];
        assert!(third.reviewed_at.is_none());
        assert_eq!(
            third.enrolled_at,
            NaiveDate::from_ymd_opt(2020, 12, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(third.days_enrolled_before_review(), None);
    }

    #[test]
    fn timestamp_columns_are_optional() {
        let csv = "Rating,Progress,Questions Asked,Questions Answered\n4.0,10.0,0,1\n";
        let dataset = load_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.records()[0].enrolled_at.is_none());
    }

    #[test]
    fn rejects_fractional_question_counts() {
        let csv = "Rating,Progress,Questions Asked,Questions Answered\n4.0,10.0,1.5,1\n";
        let err = load_reader(csv.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn rejects_missing_required_column() {
        let csv = "Rating,Progress,Questions Asked\n4.0,10.0,1\n";
        assert!(load_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn rejects_unparsable_timestamp() {
        let csv = "Rating,Timestamp,Progress,Questions Asked,Questions Answered\n4.0,yesterday,10.0,0,0\n";
        assert!(load_reader(csv.as_bytes()).is_err());
    }
}
