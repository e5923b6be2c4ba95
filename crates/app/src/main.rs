use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use exam_core::fragment::Fragment;
use services::{AppServices, Clock, ExamSourceConfig};
use ui::{App, UiApp, build_app_context};

const DB_URL_ENV: &str = "EXAM_DB_URL";
const FRAGMENT_ENV: &str = "EXAM_FRAGMENT";
const DEFAULT_DB_URL: &str = "sqlite://exam-progress.sqlite3";
const DEFAULT_LOG_FILTER: &str = "info,services=debug,app=debug";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSource { raw: String },
    InvalidFragment { raw: String, reason: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSource { raw } => write!(f, "invalid --source value: {raw:?}"),
            ArgsError::InvalidFragment { raw, reason } => {
                write!(f, "invalid --open value {raw:?}: {reason}")
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

struct DesktopApp {
    services: AppServices,
    fragment: Fragment,
}

impl UiApp for DesktopApp {
    fn services(&self) -> AppServices {
        self.services.clone()
    }

    fn initial_fragment(&self) -> Fragment {
        self.fragment.clone()
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    source: ExamSourceConfig,
    fragment: Fragment,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--source <url|dir>] [--open <fragment|url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --source .");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_ENV}, {}, {FRAGMENT_ENV}, RUST_LOG", services::EXAM_SOURCE_ENV);
}

impl Args {
    fn defaults() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            source: ExamSourceConfig::default(),
            fragment: Fragment::default(),
        }
    }

    fn from_env() -> Result<Self, ArgsError> {
        let mut args = Self::defaults();
        if let Some(raw) = non_empty_env(DB_URL_ENV) {
            args.db_url = normalize_sqlite_url(raw);
        }
        if let Some(source) = ExamSourceConfig::from_env() {
            args.source = source;
        }
        if let Some(raw) = non_empty_env(FRAGMENT_ENV) {
            args.fragment = parse_fragment(raw)?;
        }
        Ok(args)
    }

    fn parse(args: &mut impl Iterator<Item = String>, mut parsed: Self) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--source" => {
                    let value = require_value(args, "--source")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidSource { raw: value });
                    }
                    parsed.source = ExamSourceConfig::parse(&value);
                }
                "--open" => {
                    let value = require_value(args, "--open")?;
                    parsed.fragment = parse_fragment(value)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_fragment(raw: String) -> Result<Fragment, ArgsError> {
    Fragment::from_location(&raw).map_err(|err| ArgsError::InvalidFragment {
        reason: err.to_string(),
        raw,
    })
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

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_owned());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut argv = std::env::args().skip(1);
    let parsed = Args::from_env()
        .and_then(|defaults| Args::parse(&mut argv, defaults))
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;
    tracing::info!(
        db = %parsed.db_url,
        source = ?parsed.source,
        fragment = %parsed.fragment,
        "starting exam viewer"
    );

    // Open + migrate SQLite at startup, in the binary glue.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), &parsed.source).await?;

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        services,
        fragment: parsed.fragment,
    });
    let context = build_app_context(&app);

    // Dioxus/tao can default to an always-on-top window on macOS dev setups.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Exams")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("{err}");
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(ToString::to_string);
        Args::parse(&mut iter, Args::defaults())
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--source",
            "https://quiz.example.org/",
            "--open",
            "#math101#4",
        ])
        .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(
            args.source,
            ExamSourceConfig::Http("https://quiz.example.org/".into())
        );
        assert_eq!(args.fragment.to_string(), "#math101#4");
    }

    #[test]
    fn open_accepts_full_urls() {
        let args = parse(&["--open", "https://quiz.example.org/index.html#bio#2"]).unwrap();
        assert_eq!(args.fragment.to_string(), "#bio#2");
    }

    #[test]
    fn missing_and_unknown_args_are_rejected() {
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(parse(&["--bogus"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(
            parse(&["--source", " "]),
            Err(ArgsError::InvalidSource { .. })
        ));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/progress.sqlite3".into());
        let expected = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("data/progress.sqlite3");
        assert_eq!(url, format!("sqlite://{}", expected.display()));
        assert_eq!(
            normalize_sqlite_url("sqlite://already.db".into()),
            "sqlite://already.db"
        );
    }
}
