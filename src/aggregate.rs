use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dedupe::normalized_week_start;
use crate::models::{Domain, DomainAggregate, Metric, NormalizedRecord, WeekSummary};
use crate::scores::{div_round, hundredths};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

pub fn within_range(records: &[NormalizedRecord], range: DateRange) -> Vec<NormalizedRecord> {
    records
        .iter()
        .filter(|record| range.contains(record.kind.date()))
        .cloned()
        .collect()
}

pub fn sort_newest_first(records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| b.kind.sort_key().cmp(&a.kind.sort_key()));
}

pub(crate) fn totals<'a>(
    records: impl Iterator<Item = &'a NormalizedRecord>,
    metric: Metric,
) -> (i64, i64) {
    records.fold((0, 0), |(sum, count), record| {
        (sum + hundredths(record.value(metric)), count + 1)
    })
}

pub(crate) fn rounded_mean((sum, count): (i64, i64)) -> Option<f64> {
    (count > 0).then(|| div_round(sum, count) as f64 / 100.0)
}

pub fn average_over_range(records: &[NormalizedRecord], domain: Domain) -> Option<f64> {
    rounded_mean(totals(records.iter(), Metric::Domain(domain)))
}

fn aggregate_iter<'a, I>(records: I) -> DomainAggregate
where
    I: Iterator<Item = &'a NormalizedRecord> + Clone,
{
    let average = |metric| rounded_mean(totals(records.clone(), metric));

    DomainAggregate {
        peer: average(Metric::Domain(Domain::Peer)),
        adult: average(Metric::Domain(Domain::Adult)),
        investment: average(Metric::Domain(Domain::Investment)),
        authority: average(Metric::Domain(Domain::Authority)),
        overall: average(Metric::Overall),
        total_entries: records.count(),
    }
}

pub fn aggregate_domains(records: &[NormalizedRecord]) -> DomainAggregate {
    aggregate_iter(records.iter())
}

pub fn aggregate_combined(weekly: &[NormalizedRecord], daily: &[NormalizedRecord]) -> DomainAggregate {
    aggregate_iter(weekly.iter().chain(daily.iter()))
}

pub fn weekly_breakdown(records: &[NormalizedRecord]) -> Vec<WeekSummary> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&NormalizedRecord>> = BTreeMap::new();
    for record in records {
        weeks
            .entry(normalized_week_start(record.kind.date()))
            .or_default()
            .push(record);
    }

    weeks
        .into_iter()
        .map(|(week_start, members)| WeekSummary {
            week_start,
            aggregate: aggregate_iter(members.into_iter()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DomainScores, RatingKind, RecordSource, Shift};
    use crate::scores::overall;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    fn daily(day: &str, shift: Shift, scores: DomainScores<f64>) -> NormalizedRecord {
        NormalizedRecord {
            youth_id: "Y1".to_string(),
            kind: RatingKind::Daily {
                date: date(day),
                shift,
                staff: None,
            },
            overall: overall(&scores),
            scores,
            created_at: None,
            updated_at: None,
        }
    }

    fn weekly(week: &str, value: f64) -> NormalizedRecord {
        let scores = DomainScores::new(value, value, value, value);
        NormalizedRecord {
            youth_id: "Y1".to_string(),
            kind: RatingKind::Weekly {
                week_date: date(week),
                source: RecordSource::Manual,
            },
            overall: overall(&scores),
            scores,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn empty_average_is_none() {
        assert_eq!(average_over_range(&[], Domain::Peer), None);
        assert_eq!(aggregate_domains(&[]), DomainAggregate::default());
    }

    #[test]
    fn all_zero_scores_average_to_zero_not_none() {
        let records = vec![daily("2024-03-04", Shift::Day, DomainScores::default())];
        assert_eq!(average_over_range(&records, Domain::Adult), Some(0.0));
    }

    #[test]
    fn averages_round_exact_halves_up() {
        let records = vec![
            daily("2024-03-04", Shift::Day, DomainScores::new(2.3, 0.1, 0.1, 0.1)),
            daily("2024-03-04", Shift::Evening, DomainScores::new(0.0, 0.0, 0.0, 0.0)),
            daily("2024-03-04", Shift::Night, DomainScores::new(0.0, 0.0, 0.0, 0.0)),
            daily("2024-03-05", Shift::Day, DomainScores::new(0.0, 0.1, 0.1, 0.1)),
        ];
        assert_eq!(average_over_range(&records, Domain::Peer), Some(0.58));
        assert_eq!(average_over_range(&records, Domain::Adult), Some(0.05));

        let aggregate = aggregate_domains(&records);
        assert_eq!(aggregate.peer, Some(0.58));
        assert_eq!(aggregate.overall, Some(0.18));
    }

    #[test]
    fn aggregates_each_domain() {
        let records = vec![
            daily("2024-03-04", Shift::Day, DomainScores::new(4.0, 3.0, 2.0, 1.0)),
            daily("2024-03-04", Shift::Night, DomainScores::new(2.0, 3.0, 2.0, 2.0)),
        ];
        let aggregate = aggregate_domains(&records);
        assert_eq!(aggregate.peer, Some(3.0));
        assert_eq!(aggregate.adult, Some(3.0));
        assert_eq!(aggregate.investment, Some(2.0));
        assert_eq!(aggregate.authority, Some(1.5));
        assert_eq!(aggregate.overall, Some(2.38));
        assert_eq!(aggregate.total_entries, 2);
    }

    #[test]
    fn combined_weights_every_record_equally() {
        let weekly_records = vec![weekly("2024-03-04", 4.0)];
        let daily_records = vec![
            daily("2024-03-05", Shift::Day, DomainScores::new(1.0, 1.0, 1.0, 1.0)),
            daily("2024-03-05", Shift::Evening, DomainScores::new(1.0, 1.0, 1.0, 1.0)),
            daily("2024-03-06", Shift::Day, DomainScores::new(1.0, 1.0, 1.0, 1.0)),
        ];
        let combined = aggregate_combined(&weekly_records, &daily_records);
        assert_eq!(combined.peer, Some(1.75));
        assert_eq!(combined.total_entries, 4);
    }

    #[test]
    fn range_filter_is_inclusive() {
        let records = vec![
            weekly("2024-02-26", 1.0),
            weekly("2024-03-04", 2.0),
            weekly("2024-03-11", 3.0),
        ];
        let range = DateRange::new(Some(date("2024-03-04")), Some(date("2024-03-11")));
        let filtered = within_range(&records, range);
        assert_eq!(filtered.len(), 2);

        let open_ended = DateRange::new(None, Some(date("2024-02-26")));
        assert_eq!(within_range(&records, open_ended).len(), 1);
    }

    #[test]
    fn sorts_newest_first_with_shift_order() {
        let flat = DomainScores::new(2.0, 2.0, 2.0, 2.0);
        let mut records = vec![
            daily("2024-03-04", Shift::Day, flat),
            daily("2024-03-05", Shift::Day, flat),
            daily("2024-03-04", Shift::Night, flat),
            daily("2024-03-04", Shift::Evening, flat),
        ];
        sort_newest_first(&mut records);
        let order: Vec<(NaiveDate, Option<Shift>)> =
            records.iter().map(|record| record.kind.sort_key()).collect();
        assert_eq!(
            order,
            vec![
                (date("2024-03-05"), Some(Shift::Day)),
                (date("2024-03-04"), Some(Shift::Night)),
                (date("2024-03-04"), Some(Shift::Evening)),
                (date("2024-03-04"), Some(Shift::Day)),
            ]
        );
    }

    #[test]
    fn breakdown_groups_by_week() {
        let records = vec![
            daily("2024-03-12", Shift::Day, DomainScores::new(3.0, 3.0, 3.0, 3.0)),
            daily("2024-03-04", Shift::Day, DomainScores::new(2.0, 2.0, 2.0, 2.0)),
            daily("2024-03-10", Shift::Night, DomainScores::new(4.0, 4.0, 4.0, 4.0)),
        ];
        let weeks = weekly_breakdown(&records);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, date("2024-03-04"));
        assert_eq!(weeks[0].aggregate.total_entries, 2);
        assert_eq!(weeks[0].aggregate.overall, Some(3.0));
        assert_eq!(weeks[1].week_start, date("2024-03-11"));
        assert_eq!(weeks[1].aggregate.peer, Some(3.0));
    }
}
