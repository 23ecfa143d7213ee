use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{DomainRatingRecord, DomainScores, NormalizedRecord};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 4.0;
pub const MAX_SCALED: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", content = "value", rename_all = "snake_case")]
pub enum StoredScore {
    /// Already on the 0.0-4.0 scale.
    Decimal(f64),
    /// Integer tenths, 0-40.
    ScaledTenths(i64),
}

// Noise below a millionth of the last kept place is dropped before rounding.
const NOISE_SCALE: f64 = 1e6;

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = (value * factor * NOISE_SCALE).round() / NOISE_SCALE;
    scaled.round() / factor
}

pub(crate) fn hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// `numerator / denominator` rounded half away from zero. `denominator` must be positive.
pub(crate) fn div_round(numerator: i64, denominator: i64) -> i64 {
    if numerator >= 0 {
        (2 * numerator + denominator) / (2 * denominator)
    } else {
        -((-2 * numerator + denominator) / (2 * denominator))
    }
}

pub fn clamp_score(value: f64) -> f64 {
    if !value.is_finite() {
        debug!(value, "non-finite domain score treated as 0");
        return MIN_SCORE;
    }
    if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        debug!(value, "domain score clamped into range");
    }
    value.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn to_storage(value: f64) -> StoredScore {
    StoredScore::ScaledTenths((clamp_score(value) * 10.0).round() as i64)
}

pub fn from_storage(stored: StoredScore) -> f64 {
    match stored {
        StoredScore::Decimal(value) => round_to(clamp_score(value), 1),
        StoredScore::ScaledTenths(tenths) => {
            if !(0..=MAX_SCALED).contains(&tenths) {
                debug!(tenths, "scaled domain score clamped into range");
            }
            round_to(tenths.clamp(0, MAX_SCALED) as f64 / 10.0, 1)
        }
    }
}

pub fn overall(scores: &DomainScores<f64>) -> f64 {
    let tenths: i64 = [scores.peer, scores.adult, scores.investment, scores.authority]
        .iter()
        .map(|value| (value * 10.0).round() as i64)
        .sum();
    div_round(tenths * 10, 4) as f64 / 100.0
}

pub fn normalize(record: &DomainRatingRecord) -> NormalizedRecord {
    let scores = record.scores.map(|stored| from_storage(*stored));
    NormalizedRecord {
        youth_id: record.youth_id.clone(),
        kind: record.kind.clone(),
        overall: overall(&scores),
        scores,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub fn normalize_all(records: &[DomainRatingRecord]) -> Vec<NormalizedRecord> {
    records.iter().map(normalize).collect()
}

impl From<&NormalizedRecord> for DomainRatingRecord {
    fn from(record: &NormalizedRecord) -> Self {
        DomainRatingRecord {
            youth_id: record.youth_id.clone(),
            kind: record.kind.clone(),
            scores: record.scores.map(|value| to_storage(*value)),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
