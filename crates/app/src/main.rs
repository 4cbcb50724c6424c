use std::fmt;

use services::{
    AppServices, ChannelStepSource, Clock, TrackerCommand, TrackerEvent, TrackerHandle,
    spawn_tracker,
};
use storage::repository::RecordStore;
use stride_core::model::{HistoryPolicy, TrackerSettings, UserId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingUser,
    InvalidUser { raw: String },
    InvalidGoal { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingUser => write!(f, "--user or STRIDE_USER_ID is required"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
            ArgsError::InvalidGoal { raw } => write!(f, "invalid --goal value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

struct Args {
    db_url: String,
    user_id: UserId,
    settings: TrackerSettings,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run  --user <id> [--db <sqlite_url>] [--goal <kcal>] [--running] [--keep-week]");
    eprintln!("  cargo run -p app -- show --user <id> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Input for run (one per line):");
    eprintln!("  <steps>              step counter reading");
    eprintln!("  goal <kcal>          change the daily calorie goal");
    eprintln!("  new-goal <kcal>      goal for the next cycle after an achievement");
    eprintln!("  running on|off       switch between running and walking");
    eprintln!("  select-goal <name>   store a fitness goal on the user record");
    eprintln!("  badge                dismiss the badge popup");
    eprintln!("  quit");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://stride.sqlite3");
    eprintln!("  --goal 450");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STRIDE_DB_URL, STRIDE_USER_ID, STRIDE_CALORIE_GOAL, STRIDE_RUNNING_MODE");
    eprintln!("  RUST_LOG, STRIDE_LOG_FORMAT=pretty|compact");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Show,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "show" => Some(Self::Show),
            _ => None,
        }
    }
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("STRIDE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://stride.sqlite3".into(), normalize_sqlite_url);
        let mut user = std::env::var("STRIDE_USER_ID").ok();
        let mut goal = std::env::var("STRIDE_CALORIE_GOAL").ok();
        let mut running = std::env::var("STRIDE_RUNNING_MODE")
            .ok()
            .is_some_and(|value| is_truthy(&value));
        let mut history = HistoryPolicy::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => user = Some(require_value(args, "--user")?),
                "--goal" => goal = Some(require_value(args, "--goal")?),
                "--running" => running = true,
                "--keep-week" => history = HistoryPolicy::KeepWeek,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let raw_user = user.ok_or(ArgsError::MissingUser)?;
        let user_id =
            UserId::new(raw_user.as_str()).map_err(|_| ArgsError::InvalidUser { raw: raw_user })?;

        let mut settings = TrackerSettings::default()
            .with_running_mode(running)
            .with_history_policy(history);
        if let Some(raw) = goal {
            settings = raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|value| settings.clone().with_calorie_goal(value).ok())
                .ok_or(ArgsError::InvalidGoal { raw })?;
        }

        Ok(Self {
            db_url,
            user_id,
            settings,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries tracker output, logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match std::env::var("STRIDE_LOG_FORMAT").as_deref() {
        Ok("pretty") => builder.pretty().init(),
        _ => builder.compact().init(),
    }
}

// ─── Stdin input ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Input {
    Steps(u32),
    Goal(f64),
    NewGoal(f64),
    Running(bool),
    SelectGoal(String),
    AcknowledgeBadge,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match word {
        "quit" | "exit" => Ok(Input::Quit),
        "badge" => Ok(Input::AcknowledgeBadge),
        "goal" => parse_kcal(rest).map(Input::Goal),
        "new-goal" => parse_kcal(rest).map(Input::NewGoal),
        "running" => match rest {
            "on" => Ok(Input::Running(true)),
            "off" => Ok(Input::Running(false)),
            _ => Err(format!("expected `running on|off`, got {rest:?}")),
        },
        "select-goal" if !rest.is_empty() => Ok(Input::SelectGoal(rest.to_owned())),
        "select-goal" => Err("select-goal needs a goal name".into()),
        _ => word
            .parse::<u32>()
            .map(Input::Steps)
            .map_err(|_| format!("unrecognised input: {line:?}")),
    }
}

fn parse_kcal(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("expected a calorie amount, got {raw:?}"))
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn show(services: &AppServices, user_id: &UserId) -> Result<(), Box<dyn std::error::Error>> {
    match services.records().get_record(user_id).await? {
        Some(document) => println!("{}", document.to_json()?),
        None => println!("no record for {user_id}"),
    }
    Ok(())
}

async fn drive(services: &AppServices, user_id: UserId) -> Result<(), Box<dyn std::error::Error>> {
    // readings typed on stdin go through the command queue so they stay in
    // order with goal and mode changes; the sensor side stays idle
    let (_sensor, source) = ChannelStepSource::new();
    let session = services.tracker_session(user_id.clone());
    let mut handle = spawn_tracker(session, &source).await;
    info!(user = %user_id, "tracker started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => dispatch(services, &user_id, &handle, input).await?,
                    Err(message) => eprintln!("{message}"),
                }
            }
            event = handle.next_event() => match event {
                Some(event) => print_event(&event),
                None => break,
            },
        }
    }

    // let the loop work through queued input, then print what it reported
    let _ = handle.send(TrackerCommand::Shutdown);
    while let Some(event) = handle.next_event().await {
        print_event(&event);
    }
    let session = handle.shutdown().await?;
    let view = session.view();
    println!(
        "final: {} steps, {}, points {}",
        view.step_count,
        view.calories_label(),
        view.points
    );
    Ok(())
}

async fn dispatch(
    services: &AppServices,
    user_id: &UserId,
    handle: &TrackerHandle,
    input: Input,
) -> Result<(), Box<dyn std::error::Error>> {
    match input {
        Input::Steps(count) => handle.send(TrackerCommand::Sample(count))?,
        Input::Goal(kcal) => handle.send(TrackerCommand::SetCalorieGoal(kcal))?,
        Input::NewGoal(kcal) => {
            handle.send(TrackerCommand::AcknowledgeGoalPrompt)?;
            handle.send(TrackerCommand::SubmitNewGoal(kcal))?;
        }
        Input::Running(enabled) => handle.send(TrackerCommand::SetRunningMode(enabled))?,
        Input::AcknowledgeBadge => handle.send(TrackerCommand::AcknowledgeBadge)?,
        Input::SelectGoal(name) => {
            match services
                .goal_selection()
                .select_goal_named(user_id, &name)
                .await
            {
                Ok(goal) => println!("fitness goal: {}", goal.title()),
                Err(err) => eprintln!("{err}"),
            }
        }
        Input::Quit => {}
    }
    Ok(())
}

fn print_event(event: &TrackerEvent) {
    match event {
        TrackerEvent::Updated(view) => println!(
            "{} steps | {} | points {} | {}",
            view.step_count,
            view.calories_label(),
            view.points,
            view.goal
        ),
        TrackerEvent::AchievementUnlocked(event) => {
            println!("{}: {}", event.record.title, event.record.subtitle);
        }
        TrackerEvent::BadgeEarned => println!("Badge earned!"),
        TrackerEvent::PromptNewGoal => println!("Set a new goal with `new-goal <kcal>`"),
        TrackerEvent::Error(message) => eprintln!("{message}"),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Run,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging();

    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), parsed.settings).await?;

    match cmd {
        Command::Run => drive(&services, parsed.user_id).await,
        Command::Show => show(&services, &parsed.user_id).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
