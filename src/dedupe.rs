use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::models::{DomainRatingRecord, RatingKind};

/// Monday on or before `date`. Sunday belongs to the week that started six days earlier.
pub fn normalized_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// One weekly record per `(youth_id, week start)`, latest `updated_at` wins and ties go
/// to the later record. Daily records pass through.
pub fn dedupe_weekly(records: &[DomainRatingRecord]) -> Vec<DomainRatingRecord> {
    let mut output: Vec<DomainRatingRecord> = Vec::with_capacity(records.len());
    let mut positions: HashMap<(String, NaiveDate), usize> = HashMap::new();

    for record in records {
        let RatingKind::Weekly { week_date, source } = &record.kind else {
            output.push(record.clone());
            continue;
        };

        let week_start = normalized_week_start(*week_date);
        let mut normalized = record.clone();
        normalized.kind = RatingKind::Weekly {
            week_date: week_start,
            source: *source,
        };

        match positions.get(&(record.youth_id.clone(), week_start)) {
            Some(&position) => {
                if normalized.updated_at >= output[position].updated_at {
                    debug!(
                        youth_id = %record.youth_id,
                        week_start = %week_start,
                        "replacing older weekly record"
                    );
                    output[position] = normalized;
                }
            }
            None => {
                positions.insert((record.youth_id.clone(), week_start), output.len());
                output.push(normalized);
            }
        }
    }

    output
}
