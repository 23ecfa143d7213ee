use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use youth_progress::{DomainRatingRecord, DomainScores, RatingKind, RecordSource, Shift, StoredScore};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read rating csv: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct WeeklyRow {
    youth_id: String,
    week_date: NaiveDate,
    peer: i64,
    adult: i64,
    investment: i64,
    authority: i64,
    source: Option<RecordSource>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct DailyRow {
    youth_id: String,
    date: NaiveDate,
    shift: Shift,
    peer: i64,
    adult: i64,
    investment: i64,
    authority: i64,
    staff: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

fn scaled(peer: i64, adult: i64, investment: i64, authority: i64) -> DomainScores<StoredScore> {
    DomainScores::new(
        StoredScore::ScaledTenths(peer),
        StoredScore::ScaledTenths(adult),
        StoredScore::ScaledTenths(investment),
        StoredScore::ScaledTenths(authority),
    )
}

pub fn read_weekly<R: Read>(reader: R) -> Result<Vec<DomainRatingRecord>, ImportError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in reader.deserialize::<WeeklyRow>() {
        let row = result?;
        records.push(DomainRatingRecord {
            youth_id: row.youth_id,
            kind: RatingKind::Weekly {
                week_date: row.week_date,
                source: row.source.unwrap_or_default(),
            },
            scores: scaled(row.peer, row.adult, row.investment, row.authority),
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
    }

    Ok(records)
}

pub fn read_daily<R: Read>(reader: R) -> Result<Vec<DomainRatingRecord>, ImportError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in reader.deserialize::<DailyRow>() {
        let row = result?;
        records.push(DomainRatingRecord {
            youth_id: row.youth_id,
            kind: RatingKind::Daily {
                date: row.date,
                shift: row.shift,
                staff: row.staff.filter(|staff| !staff.trim().is_empty()),
            },
            scores: scaled(row.peer, row.adult, row.investment, row.authority),
            created_at: row.created_at,
            updated_at: row.updated_at,
        });
    }

    Ok(records)
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_weekly(path: &Path) -> Result<Vec<DomainRatingRecord>, ImportError> {
    let records = read_weekly(open(path)?)?;
    info!(path = %path.display(), count = records.len(), "loaded weekly evaluations");
    Ok(records)
}

pub fn load_daily(path: &Path) -> Result<Vec<DomainRatingRecord>, ImportError> {
    let records = read_daily(open(path)?)?;
    info!(path = %path.display(), count = records.len(), "loaded daily shift ratings");
    Ok(records)
}

/// Groups records per youth in file order. `Some(id)` keeps only that youth.
pub fn by_youth(
    records: Vec<DomainRatingRecord>,
    youth_id: Option<&str>,
) -> BTreeMap<String, Vec<DomainRatingRecord>> {
    let mut groups: BTreeMap<String, Vec<DomainRatingRecord>> = BTreeMap::new();
    for record in records {
        if youth_id.map_or(true, |id| record.youth_id == id) {
            groups.entry(record.youth_id.clone()).or_default().push(record);
        }
    }
    groups
}
