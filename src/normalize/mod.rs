//! Daily counts → weekly per-100k series.
//!
//! Steps, in order:
//! 1. filter by region and optional start date
//! 2. reject negative counts, skip non-positive populations, scale to per-100k
//! 3. group into week-ending-Monday buckets and fold each bucket into a point
//! 4. fill empty weeks with zeros and apply the trailing-week policy
//!
//! The pipeline is a pure function of its input: no global state, no shared
//! accumulators, and the same records always produce the same series.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{NormalizeOutput, NormalizedPoint, RawRecord, Series, TrailingWeek};
use crate::error::NormalizeError;

pub mod week;

pub use week::{next_week, week_ending, week_last_day, week_start};

/// Population base for normalized values.
pub const PER_POPULATION: f64 = 100_000.0;

/// Selection and trailing-week policy for one pipeline call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub region: String,
    /// Records strictly before this date are dropped.
    pub start_date: Option<NaiveDate>,
    pub trailing_week: TrailingWeek,
}

impl NormalizeOptions {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            start_date: None,
            trailing_week: TrailingWeek::default(),
        }
    }

    pub fn start_date(mut self, start_date: Option<NaiveDate>) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn trailing_week(mut self, trailing_week: TrailingWeek) -> Self {
        self.trailing_week = trailing_week;
        self
    }
}

/// Normalize `records` for `region` with the default trailing-week policy.
pub fn normalize(
    records: &[RawRecord],
    region: &str,
    start_date: Option<NaiveDate>,
) -> Result<NormalizeOutput, NormalizeError> {
    normalize_with(records, &NormalizeOptions::new(region).start_date(start_date))
}

/// Normalize `records` according to `options`.
pub fn normalize_with(
    records: &[RawRecord],
    options: &NormalizeOptions,
) -> Result<NormalizeOutput, NormalizeError> {
    let empty = || NormalizeError::EmptyInput {
        region: options.region.clone(),
    };

    let selected: Vec<&RawRecord> = records
        .iter()
        .filter(|r| r.region == options.region)
        .filter(|r| options.start_date.is_none_or(|start| r.date >= start))
        .collect();

    if selected.is_empty() {
        return Err(empty());
    }

    // Coverage of the final week is judged on every selected date, including
    // records later skipped for their population.
    let Some(last_date) = selected.iter().map(|r| r.date).max() else {
        return Err(empty());
    };

    let mut scaled = Vec::with_capacity(selected.len());
    let mut skipped_population = 0usize;
    for record in selected {
        match scale_record(record)? {
            Some(s) => scaled.push(s),
            None => {
                warn!(
                    region = %record.region,
                    date = %record.date,
                    population = record.population,
                    "skipping record with non-positive population"
                );
                skipped_population += 1;
            }
        }
    }

    if scaled.is_empty() {
        return Err(empty());
    }

    // Sorting by (week, date) makes each bucket's summation order independent
    // of input order.
    scaled.sort_by_key(|s| (s.week_ending, s.date));

    let buckets = scaled
        .chunk_by(|a, b| a.week_ending == b.week_ending)
        .map(|bucket| fold_bucket(bucket, &options.region))
        .collect::<Result<Vec<_>, _>>()?;

    let buckets = fill_missing_weeks(buckets);
    let buckets = apply_trailing_week(buckets, last_date, options.trailing_week);

    debug!(
        region = %options.region,
        records = scaled.len(),
        skipped_population,
        weeks = buckets.len(),
        "normalized weekly series"
    );

    Ok(NormalizeOutput {
        series: Series::from_points(buckets),
        records_used: scaled.len(),
        skipped_population,
    })
}

/// `count / population * 100_000`.
pub fn per_100k(count: i64, population: i64) -> f64 {
    count as f64 / population as f64 * PER_POPULATION
}

#[derive(Debug, Clone, Copy)]
struct ScaledRecord {
    week_ending: NaiveDate,
    date: NaiveDate,
    value: f64,
    count: u64,
}

/// `Ok(None)` marks a data-quality skip (population ≤ 0).
fn scale_record(record: &RawRecord) -> Result<Option<ScaledRecord>, NormalizeError> {
    if record.count < 0 {
        return Err(NormalizeError::InvalidRecord {
            region: record.region.clone(),
            date: record.date,
            count: record.count,
        });
    }
    if record.population <= 0 {
        return Ok(None);
    }

    let week_ending = week_ending(record.date).ok_or_else(|| NormalizeError::DateOutOfRange {
        region: record.region.clone(),
        date: record.date,
    })?;

    Ok(Some(ScaledRecord {
        week_ending,
        date: record.date,
        value: per_100k(record.count, record.population),
        count: record.count.unsigned_abs(),
    }))
}

fn fold_bucket(bucket: &[ScaledRecord], region: &str) -> Result<NormalizedPoint, NormalizeError> {
    let seed = NormalizedPoint {
        week_ending: bucket[0].week_ending,
        value_per_100k: 0.0,
        raw_count: 0,
    };
    bucket.iter().try_fold(seed, |acc, s| {
        let raw_count = acc
            .raw_count
            .checked_add(s.count)
            .ok_or_else(|| NormalizeError::CountOverflow {
                region: region.to_string(),
                week_ending: acc.week_ending,
            })?;
        Ok(NormalizedPoint {
            value_per_100k: acc.value_per_100k + s.value,
            raw_count,
            ..acc
        })
    })
}

/// Insert zero-valued weeks so consecutive labels are exactly 7 days apart.
fn fill_missing_weeks(buckets: Vec<NormalizedPoint>) -> Vec<NormalizedPoint> {
    let mut out: Vec<NormalizedPoint> = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        // Gaps sit strictly before an existing label, so `next_week` stays in range.
        let mut label = out.last().and_then(|p| next_week(p.week_ending));
        while let Some(missing) = label.filter(|l| *l < bucket.week_ending) {
            out.push(NormalizedPoint {
                week_ending: missing,
                value_per_100k: 0.0,
                raw_count: 0,
            });
            label = next_week(missing);
        }
        out.push(bucket);
    }
    out
}

/// A single-week series is never emptied by the policy.
fn apply_trailing_week(
    mut buckets: Vec<NormalizedPoint>,
    last_date: NaiveDate,
    policy: TrailingWeek,
) -> Vec<NormalizedPoint> {
    if buckets.len() <= 1 {
        return buckets;
    }

    let drop_last = match policy {
        TrailingWeek::Drop => true,
        TrailingWeek::DropPartial => buckets
            .last()
            .and_then(|b| week_last_day(b.week_ending))
            .is_some_and(|sunday| last_date < sunday),
        TrailingWeek::Keep => false,
    };

    if drop_last {
        if let Some(dropped) = buckets.pop() {
            debug!(week_ending = %dropped.week_ending, ?policy, "dropped trailing week");
        }
    }
    buckets
}
