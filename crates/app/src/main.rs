use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::Clock;
use services::{AppServices, CatalogConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod console;

use console::ConsoleSink;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDelay { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDelay { raw } => write!(f, "invalid --delay-ms value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  movie-quiz play  [--db <sqlite_url>] [--catalog-url <url>] [--delay-ms <n>]");
    eprintln!("  movie-quiz stats [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://movie_quiz.sqlite3");
    eprintln!("  --delay-ms 1000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MOVIE_QUIZ_DB_URL, MOVIE_QUIZ_CATALOG_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Stats,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    catalog: CatalogConfig,
    advance_delay: Duration,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("MOVIE_QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://movie_quiz.sqlite3".into(), normalize_sqlite_url);
        let mut catalog = CatalogConfig::from_env();
        let mut advance_delay = services::session::DEFAULT_ADVANCE_DELAY;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--catalog-url" => {
                    catalog = catalog.with_url(require_value(args, "--catalog-url")?);
                }
                "--delay-ms" => {
                    let value = require_value(args, "--delay-ms")?;
                    let millis: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDelay { raw: value.clone() })?;
                    advance_delay = Duration::from_millis(millis);
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
            catalog,
            advance_delay,
        })
    }
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

async fn play(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let sink = Arc::new(ConsoleSink::default());
    let session = services.new_session(sink.clone());
    let handle = session.handle();
    let session_task = tokio::spawn(session.run());

    println!("Movie quiz: answer y or n, q to quit.");
    handle.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !sink.handle_input(&line, &handle) {
            break;
        }
    }

    handle.shutdown();
    session_task.await?;
    Ok(())
}

async fn print_stats(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let stats = services.statistics().snapshot().await?;
    println!("Games played: {}", stats.games_played);
    println!(
        "Answers: {}/{} ({:.2}%)",
        stats.correct_total,
        stats.question_total,
        stats.total_accuracy()
    );
    match stats.best_game {
        Some(best) => println!(
            "Record: {}/{} ({})",
            best.correct(),
            best.total(),
            best.date().format("%d.%m.%y %H:%M")
        ),
        None => println!("Record: no games yet"),
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    info!(db_url = %parsed.db_url, catalog = %parsed.catalog.url, "starting");
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), parsed.catalog)
        .await?
        .with_advance_delay(parsed.advance_delay);

    match cmd {
        Command::Play => play(&services).await,
        Command::Stats => print_stats(&services).await,
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_owned());
        Args::parse(&mut iter)
    }

    #[test]
    fn parses_flags() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--catalog-url",
            "http://localhost/movies",
            "--delay-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.catalog.url, "http://localhost/movies");
        assert_eq!(args.advance_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_delay_and_unknown_flags() {
        assert!(matches!(
            parse(&["--delay-ms", "soon"]),
            Err(ArgsError::InvalidDelay { .. })
        ));
        assert!(matches!(parse(&["--fast"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:quiz.sqlite3".to_owned());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("quiz.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".to_owned()),
            "sqlite::memory:"
        );
    }

    #[test]
    fn commands_parse_from_first_argument() {
        assert_eq!(Command::from_arg("play"), Some(Command::Play));
        assert_eq!(Command::from_arg("stats"), Some(Command::Stats));
        assert_eq!(Command::from_arg("seed"), None);
    }
}
