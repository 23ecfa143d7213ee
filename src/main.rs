use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::warn;
use youth_progress::{
    aggregate_combined, aggregate_domains, classify_trend, dedupe_weekly, normalize_all,
    sort_newest_first, weekly_breakdown, within_range, DateRange, DomainAggregate,
    DomainRatingRecord, LevelProgress, LevelTable, NormalizedRecord, TrendConfig, TrendSummary,
    WeekSummary, YouthLevelState,
};

mod config;
mod import;
mod telemetry;

use config::EngineConfig;

#[derive(Parser)]
#[command(name = "youth-progress")]
#[command(about = "Level progression and behavior rating summaries for youth program staff", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a youth's level status and optionally apply a transition
    Level {
        #[arg(long, allow_negative_numbers = true)]
        index: i64,
        #[arg(long, default_value_t = 0)]
        points: u32,
        /// Points earned today, checked against the privilege threshold
        #[arg(long)]
        today: Option<u32>,
        /// Points to award before evaluating
        #[arg(long)]
        award: Option<u32>,
        #[arg(long, value_enum)]
        apply: Option<Transition>,
    },
    /// Summarize weekly evaluations exported as CSV, one report per youth
    Weekly {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        youth: Option<String>,
        #[arg(long)]
        since: Option<NaiveDate>,
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Summarize daily shift ratings exported as CSV, one report per youth
    Daily {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        youth: Option<String>,
        #[arg(long)]
        since: Option<NaiveDate>,
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Average weekly and daily ratings together
    Combined {
        #[arg(long)]
        weekly: PathBuf,
        #[arg(long)]
        daily: PathBuf,
        #[arg(long)]
        youth: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Transition {
    Up,
    Demote,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum TransitionOutcome {
    Applied { state: YouthLevelState },
    Rejected { reason: String },
}

#[derive(Serialize)]
struct LevelReport {
    state: YouthLevelState,
    clamped_index: bool,
    progress: LevelProgress,
    can_level_up: bool,
    meets_privileges: Option<bool>,
    transition: Option<TransitionOutcome>,
}

#[derive(Serialize)]
struct RatingReport {
    youth_id: String,
    aggregate: DomainAggregate,
    trend: Option<TrendSummary>,
    weeks: Vec<WeekSummary>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::load().context("invalid engine configuration")?;
    telemetry::init(&config.log_level).context("failed to initialise logging")?;

    match cli.command {
        Commands::Level {
            index,
            points,
            today,
            award,
            apply,
        } => {
            let table = config.level_table()?;
            let mut state = YouthLevelState::new(index, points);
            if !table.contains_index(&state) {
                warn!(
                    level_index = index,
                    levels = table.len(),
                    "level index is off the ladder, reporting level 0"
                );
            }
            if let Some(award) = award {
                state = table.award_points(&state, award);
            }
            let report = level_report(&table, state, today, apply);
            emit(cli.json, &report, print_level)?;
        }
        Commands::Weekly {
            csv,
            youth,
            since,
            until,
        } => {
            let range = DateRange::new(since, until);
            let reports: Vec<RatingReport> =
                import::by_youth(import::load_weekly(&csv)?, youth.as_deref())
                    .into_iter()
                    .map(|(youth_id, records)| {
                        let normalized = prepare(&dedupe_weekly(&records), range);
                        rating_report(youth_id, &normalized, Some(&config.weekly_trend), false)
                    })
                    .collect();
            emit(cli.json, &reports, |reports| {
                print_ratings("Weekly evaluations", reports)
            })?;
        }
        Commands::Daily {
            csv,
            youth,
            since,
            until,
        } => {
            let range = DateRange::new(since, until);
            let reports: Vec<RatingReport> =
                import::by_youth(import::load_daily(&csv)?, youth.as_deref())
                    .into_iter()
                    .map(|(youth_id, records)| {
                        let normalized = prepare(&records, range);
                        rating_report(youth_id, &normalized, Some(&config.daily_trend), true)
                    })
                    .collect();
            emit(cli.json, &reports, |reports| {
                print_ratings("Daily shift ratings", reports)
            })?;
        }
        Commands::Combined {
            weekly,
            daily,
            youth,
        } => {
            let reports = combined_reports(
                import::by_youth(import::load_weekly(&weekly)?, youth.as_deref()),
                import::by_youth(import::load_daily(&daily)?, youth.as_deref()),
            );
            emit(cli.json, &reports, |reports| {
                print_ratings("Weekly and daily ratings", reports)
            })?;
        }
    }

    Ok(())
}

fn prepare(records: &[DomainRatingRecord], range: DateRange) -> Vec<NormalizedRecord> {
    let mut normalized = within_range(&normalize_all(records), range);
    sort_newest_first(&mut normalized);
    normalized
}

fn level_report(
    table: &LevelTable,
    state: YouthLevelState,
    today: Option<u32>,
    apply: Option<Transition>,
) -> LevelReport {
    let transition = apply.map(|transition| {
        let result = match transition {
            Transition::Up => table.apply_level_up(&state),
            Transition::Demote => table.apply_level_demotion(&state),
        };
        match result {
            Ok(state) => TransitionOutcome::Applied { state },
            Err(reason) => TransitionOutcome::Rejected {
                reason: reason.to_string(),
            },
        }
    });

    LevelReport {
        state,
        clamped_index: !table.contains_index(&state),
        progress: table.progress(&state),
        can_level_up: table.can_level_up(&state),
        meets_privileges: today.map(|points| table.meets_privilege_requirement(&state, points)),
        transition,
    }
}

fn rating_report(
    youth_id: String,
    newest_first: &[NormalizedRecord],
    trend: Option<&TrendConfig>,
    with_weeks: bool,
) -> RatingReport {
    RatingReport {
        youth_id,
        aggregate: aggregate_domains(newest_first),
        trend: trend.map(|config| classify_trend(newest_first, config)),
        weeks: if with_weeks {
            weekly_breakdown(newest_first)
        } else {
            Vec::new()
        },
    }
}

/// A youth present in only one of the files still gets a report.
fn combined_reports(
    mut weekly: BTreeMap<String, Vec<DomainRatingRecord>>,
    mut daily: BTreeMap<String, Vec<DomainRatingRecord>>,
) -> Vec<RatingReport> {
    let youths: BTreeSet<String> = weekly.keys().chain(daily.keys()).cloned().collect();
    let all_dates = DateRange::new(None, None);

    youths
        .into_iter()
        .map(|youth_id| {
            let weekly_records = weekly.remove(&youth_id).unwrap_or_default();
            let daily_records = daily.remove(&youth_id).unwrap_or_default();
            RatingReport {
                aggregate: aggregate_combined(
                    &prepare(&dedupe_weekly(&weekly_records), all_dates),
                    &prepare(&daily_records, all_dates),
                ),
                youth_id,
                trend: None,
                weeks: Vec::new(),
            }
        })
        .collect()
}

fn emit<T: Serialize>(json: bool, value: &T, print: impl FnOnce(&T)) -> anyhow::Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(value).context("failed to encode output")?;
        println!("{rendered}");
    } else {
        print(value);
    }
    Ok(())
}

fn score(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "no data".to_string())
}

fn print_level(report: &LevelReport) {
    let progress = &report.progress;
    println!(
        "{} (level {}) with {} points",
        progress.level.name, progress.level.index, progress.points
    );
    if report.clamped_index {
        println!(
            "- stored level index {} is not on the ladder",
            report.state.level_index
        );
    }
    match (progress.required, progress.remaining) {
        (Some(required), Some(remaining)) => {
            println!("- {remaining} of {required} points still needed to level up")
        }
        _ => println!("- top of the ladder"),
    }
    if let Some(next) = &progress.next_level {
        println!("- next level: {}", next.name);
    }
    println!("- eligible to level up: {}", report.can_level_up);
    if let Some(meets) = report.meets_privileges {
        println!(
            "- privileges today: {}",
            if meets { "kept" } else { "lost" }
        );
    }
    match &report.transition {
        Some(TransitionOutcome::Applied { state }) => println!(
            "Transition applied: now level {} with {} points.",
            state.level_index, state.points_in_current_level
        ),
        Some(TransitionOutcome::Rejected { reason }) => println!("Transition rejected: {reason}."),
        None => {}
    }
}

fn print_ratings(title: &str, reports: &[RatingReport]) {
    if reports.is_empty() {
        println!("No ratings found.");
        return;
    }
    println!("{title}");
    for report in reports {
        print_youth(report);
    }
}

fn print_youth(report: &RatingReport) {
    let aggregate = &report.aggregate;
    if aggregate.total_entries == 0 {
        println!("\n{}: no ratings found for this window.", report.youth_id);
        return;
    }

    println!("\n{} ({} entries):", report.youth_id, aggregate.total_entries);
    println!("- peer {}", score(aggregate.peer));
    println!("- adult {}", score(aggregate.adult));
    println!("- investment {}", score(aggregate.investment));
    println!("- authority {}", score(aggregate.authority));
    println!("- overall {}", score(aggregate.overall));

    if let Some(trend) = &report.trend {
        println!(
            "Trend: {} (recent {}, previous {}, window {})",
            trend.trend,
            score(trend.recent_average),
            score(trend.previous_average),
            trend.window_size
        );
    }

    for week in &report.weeks {
        println!(
            "- week of {}: overall {} across {} entries",
            week.week_start,
            score(week.aggregate.overall),
            week.aggregate.total_entries
        );
    }
}
