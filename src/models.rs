use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scores::StoredScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Peer,
    Adult,
    Investment,
    Authority,
}

impl Domain {
    pub const ALL: [Domain; 4] = [
        Domain::Peer,
        Domain::Adult,
        Domain::Investment,
        Domain::Authority,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Peer => "peer",
            Domain::Adult => "adult",
            Domain::Investment => "investment",
            Domain::Authority => "authority",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Overall,
    Domain(Domain),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainScores<T> {
    pub peer: T,
    pub adult: T,
    pub investment: T,
    pub authority: T,
}

impl<T> DomainScores<T> {
    pub fn new(peer: T, adult: T, investment: T, authority: T) -> Self {
        Self {
            peer,
            adult,
            investment,
            authority,
        }
    }

    pub fn get(&self, domain: Domain) -> &T {
        match domain {
            Domain::Peer => &self.peer,
            Domain::Adult => &self.adult,
            Domain::Investment => &self.investment,
            Domain::Authority => &self.authority,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> DomainScores<U> {
        DomainScores {
            peer: f(&self.peer),
            adult: f(&self.adult),
            investment: f(&self.investment),
            authority: f(&self.authority),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Day,
    Evening,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    #[default]
    Manual,
    Uploaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatingKind {
    Weekly {
        week_date: NaiveDate,
        source: RecordSource,
    },
    Daily {
        date: NaiveDate,
        shift: Shift,
        staff: Option<String>,
    },
}

impl RatingKind {
    pub fn date(&self) -> NaiveDate {
        match self {
            RatingKind::Weekly { week_date, .. } => *week_date,
            RatingKind::Daily { date, .. } => *date,
        }
    }

    pub fn sort_key(&self) -> (NaiveDate, Option<Shift>) {
        match self {
            RatingKind::Weekly { week_date, .. } => (*week_date, None),
            RatingKind::Daily { date, shift, .. } => (*date, Some(*shift)),
        }
    }

    pub fn is_weekly(&self) -> bool {
        matches!(self, RatingKind::Weekly { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRatingRecord {
    pub youth_id: String,
    pub kind: RatingKind,
    pub scores: DomainScores<StoredScore>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub youth_id: String,
    pub kind: RatingKind,
    pub scores: DomainScores<f64>,
    pub overall: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NormalizedRecord {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Overall => self.overall,
            Metric::Domain(domain) => *self.scores.get(domain),
        }
    }
}

/// Averages across a set of records. `None` means no records, not a zero score.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DomainAggregate {
    pub peer: Option<f64>,
    pub adult: Option<f64>,
    pub investment: Option<f64>,
    pub authority: Option<f64>,
    pub overall: Option<f64>,
    pub total_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub aggregate: DomainAggregate,
}
