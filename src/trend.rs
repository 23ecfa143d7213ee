use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::aggregate::{rounded_mean, totals};
use crate::models::{Metric, NormalizedRecord};
use crate::scores::{div_round, hundredths};

pub const WEEKLY_THRESHOLD: f64 = 0.2;
pub const DAILY_THRESHOLD: f64 = 0.15;
pub const LEGACY_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => f.write_str("improving"),
            Trend::Declining => f.write_str("declining"),
            Trend::Stable => f.write_str("stable"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum WindowPolicy {
    Weekly,
    Daily,
    Legacy,
    Fixed(usize),
    Custom(fn(usize) -> usize),
}

impl WindowPolicy {
    pub fn window_size(&self, record_count: usize) -> usize {
        match self {
            WindowPolicy::Weekly => (record_count / 2).min(5),
            WindowPolicy::Daily => (record_count / 3).min(7).max(2),
            WindowPolicy::Legacy => 7,
            WindowPolicy::Fixed(size) => *size,
            WindowPolicy::Custom(policy) => policy(record_count),
        }
    }
}

/// Custom policies never compare equal, function addresses are not stable.
impl PartialEq for WindowPolicy {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (WindowPolicy::Weekly, WindowPolicy::Weekly)
            | (WindowPolicy::Daily, WindowPolicy::Daily)
            | (WindowPolicy::Legacy, WindowPolicy::Legacy) => true,
            (WindowPolicy::Fixed(a), WindowPolicy::Fixed(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown window policy '{0}' (expected weekly, daily, legacy or fixed:N)")]
pub struct UnknownWindowPolicy(pub String);

impl FromStr for WindowPolicy {
    type Err = UnknownWindowPolicy;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().to_ascii_lowercase();
        match trimmed.as_str() {
            "weekly" => Ok(WindowPolicy::Weekly),
            "daily" => Ok(WindowPolicy::Daily),
            "legacy" => Ok(WindowPolicy::Legacy),
            other => other
                .strip_prefix("fixed:")
                .and_then(|size| size.parse::<usize>().ok())
                .map(WindowPolicy::Fixed)
                .ok_or_else(|| UnknownWindowPolicy(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendConfig {
    pub threshold: f64,
    pub policy: WindowPolicy,
}

impl TrendConfig {
    pub fn new(threshold: f64, policy: WindowPolicy) -> Self {
        Self { threshold, policy }
    }

    pub fn weekly() -> Self {
        Self::new(WEEKLY_THRESHOLD, WindowPolicy::Weekly)
    }

    pub fn daily() -> Self {
        Self::new(DAILY_THRESHOLD, WindowPolicy::Daily)
    }

    pub fn legacy() -> Self {
        Self::new(LEGACY_THRESHOLD, WindowPolicy::Legacy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub trend: Trend,
    pub recent_average: Option<f64>,
    pub previous_average: Option<f64>,
    pub window_size: usize,
    pub sample_size: usize,
}

/// Classifies the overall score of `records`, which must be sorted newest first.
pub fn classify_trend(records: &[NormalizedRecord], config: &TrendConfig) -> TrendSummary {
    classify_trend_by(records, Metric::Overall, config)
}

pub fn classify_trend_by(
    records: &[NormalizedRecord],
    metric: Metric,
    config: &TrendConfig,
) -> TrendSummary {
    let sample_size = records.len();
    let window_size = config.policy.window_size(sample_size);

    if window_size == 0 || sample_size < window_size.saturating_mul(2) {
        let average = rounded_mean(totals(records.iter(), metric));
        return TrendSummary {
            trend: Trend::Stable,
            recent_average: average,
            previous_average: average,
            window_size,
            sample_size,
        };
    }

    let recent = totals(records[..window_size].iter(), metric);
    let previous = totals(records[window_size..window_size * 2].iter(), metric);

    // Both windows hold `window_size` records, so the change is compared in hundredths.
    let change = div_round(recent.0 - previous.0, window_size as i64);
    let threshold = hundredths(config.threshold);

    let trend = if change > threshold {
        Trend::Improving
    } else if change < -threshold {
        Trend::Declining
    } else {
        Trend::Stable
    };

    TrendSummary {
        trend,
        recent_average: rounded_mean(recent),
        previous_average: rounded_mean(previous),
        window_size,
        sample_size,
    }
}
