use std::fmt;

use chrono::{DateTime, Duration, Utc};
use storage::{Storage, UserDocument};
use stride_core::Clock;
use stride_core::model::{
    FitnessGoal, ProgressEntry, ProgressHistory, UserId, WALKING_CALORIES_PER_STEP,
};
use stride_core::tracker::ActivitySnapshot;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    days: u8,
    base_steps: u32,
    goal: Option<FitnessGoal>,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingUser,
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidDays { raw: String },
    InvalidSteps { raw: String },
    InvalidGoal { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingUser => write!(f, "--user (or STRIDE_USER_ID) is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidDays { raw } => write!(f, "invalid --days value (1-7): {raw}"),
            ArgsError::InvalidSteps { raw } => write!(f, "invalid --steps value: {raw}"),
            ArgsError::InvalidGoal { raw } => write!(f, "invalid --goal value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_days(value: String) -> Result<u8, ArgsError> {
    match value.parse::<u8>() {
        Ok(days) if (1..=7).contains(&days) => Ok(days),
        _ => Err(ArgsError::InvalidDays { raw: value }),
    }
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("STRIDE_DB_URL").unwrap_or_else(|_| "sqlite:stride.sqlite3?mode=rwc".into());
        let mut user_id = std::env::var("STRIDE_USER_ID")
            .ok()
            .and_then(|value| UserId::new(value).ok());
        let mut days = 7;
        let mut base_steps = 6_000;
        let mut goal = None;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = Some(
                        UserId::new(value.clone())
                            .map_err(|_| ArgsError::InvalidUser { raw: value })?,
                    );
                }
                "--days" => {
                    let value = require_value(&mut args, "--days")?;
                    days = parse_days(value)?;
                }
                "--steps" => {
                    let value = require_value(&mut args, "--steps")?;
                    base_steps = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidSteps { raw: value.clone() })?;
                }
                "--goal" => {
                    let value = require_value(&mut args, "--goal")?;
                    goal = Some(
                        value
                            .parse::<FitnessGoal>()
                            .map_err(|_| ArgsError::InvalidGoal { raw: value.clone() })?,
                    );
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id: user_id.ok_or(ArgsError::MissingUser)?,
            days,
            base_steps,
            goal,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- --user <id> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:stride.sqlite3?mode=rwc)");
    eprintln!("  --user <id>               User record to write");
    eprintln!("  --days <n>                Days of history ending today, 1-7 (default: 7)");
    eprintln!("  --steps <n>               Steps on the first seeded day (default: 6000)");
    eprintln!("  --goal <name>             Fitness goal to store (e.g. lose_weight)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STRIDE_DB_URL, STRIDE_USER_ID");
}

/// A week of walking with a slow upward trend, today last.
fn demo_snapshot(clock: Clock, days: u8, base_steps: u32) -> ActivitySnapshot {
    let mut progress = ProgressHistory::new();
    let mut today_steps = 0;
    for offset in (0..days).rev() {
        let mut day_clock = clock;
        day_clock.advance(-Duration::days(i64::from(offset)));
        let steps = base_steps + 750 * u32::from(days - 1 - offset);
        progress.record(ProgressEntry::new(
            day_clock.today(),
            steps,
            f64::from(steps) * WALKING_CALORIES_PER_STEP,
        ));
        today_steps = steps;
    }

    ActivitySnapshot {
        step_count: today_steps,
        calories_burned: f64::from(today_steps) * WALKING_CALORIES_PER_STEP,
        points: 0,
        progress,
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let clock = Clock::fixed(args.now.unwrap_or_else(Utc::now));

    let mut document =
        UserDocument::from_snapshot(&demo_snapshot(clock, args.days, args.base_steps));
    if let Some(existing) = storage.records.get_record(&args.user_id).await? {
        document = document.with_profile_from(&existing);
    }
    if let Some(goal) = args.goal {
        document.set_selected_goal(goal);
    }
    storage.records.put_record(&args.user_id, &document).await?;

    println!(
        "Seeded {} day(s) of progress for {} into {}",
        document.progress_data.len(),
        args.user_id,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
