use chrono::{Duration, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_VAULT_PATH: &str = ".";

#[derive(Parser, Debug)]
#[command(name = "kobo-highlights")]
#[command(about = "Import highlights from a Kobo e-reader database into Markdown notes")]
pub struct CliArgs {
    /// Root folder of the notes vault
    #[arg(short, long, global = true)]
    pub vault: Option<String>,

    /// Path to the settings file (defaults to <vault>/.kobo-highlights/settings.json)
    #[arg(short, long, global = true)]
    pub settings: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract highlights from a KoboReader.sqlite file into one note per book
    Import(ImportArgs),
    /// List the folders notes can be stored in
    Folders,
    /// Choose the folder notes are stored in
    SetFolder {
        /// One of the names printed by `folders`
        folder: String,
    },
    /// Show the current settings
    Settings,
}

#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Path to the KoboReader.sqlite file
    pub database: Option<String>,

    /// Only highlights created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Only highlights created on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Only highlights from the last N days, today included (mutually exclusive with --from/--to)
    #[arg(short, long)]
    pub last: Option<u32>,

    /// Write into this folder for this run instead of the stored one
    #[arg(short, long)]
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub vault_path: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Import(ImportOptions),
    ListFolders,
    SetFolder(String),
    ShowSettings,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportOptions {
    pub database_path: Option<PathBuf>,
    pub date_range: Option<DateRange>,
    pub folder_override: Option<String>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid date format: '{0}'. Expected YYYY-MM-DD")]
    InvalidDateFormat(String),
    #[error("Invalid date range: --from must be before or equal to --to")]
    InvalidDateRange,
    #[error("Use --from/--to OR --last, not both")]
    MutuallyExclusiveFlags,
    #[error("Use --from together with --to")]
    MissingFromDate,
    #[error("Invalid --last value: {0}. Expected a positive number of days within the calendar")]
    InvalidDayCount(u32),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let cli = CliArgs::parse();
        Self::from_args(cli, Local::now().date_naive(), |key| std::env::var(key).ok())
    }

    fn from_args(
        cli: CliArgs,
        today: NaiveDate,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let vault_path = cli
            .vault
            .or_else(|| env("VAULT_PATH"))
            .unwrap_or_else(|| DEFAULT_VAULT_PATH.to_string());

        let settings_path = cli.settings.or_else(|| env("KOBO_SETTINGS_PATH"));

        let action = match cli.command {
            Command::Import(args) => {
                let date_range = resolve_dates(&args, today)?;
                let database_path = args.database.or_else(|| env("KOBO_DB_PATH"));
                Action::Import(ImportOptions {
                    database_path: database_path.map(PathBuf::from),
                    date_range,
                    folder_override: args.folder,
                })
            }
            Command::Folders => Action::ListFolders,
            Command::SetFolder { folder } => Action::SetFolder(folder),
            Command::Settings => Action::ShowSettings,
        };

        Ok(Config {
            vault_path: PathBuf::from(vault_path),
            settings_path: settings_path.map(PathBuf::from),
            action,
        })
    }
}

fn resolve_dates(args: &ImportArgs, today: NaiveDate) -> Result<Option<DateRange>, ConfigError> {
    let has_from_to = args.from.is_some() || args.to.is_some();

    if has_from_to && args.last.is_some() {
        return Err(ConfigError::MutuallyExclusiveFlags);
    }

    if let Some(days) = args.last {
        if days == 0 {
            return Err(ConfigError::InvalidDayCount(days));
        }
        let from = today
            .checked_sub_signed(Duration::days(i64::from(days - 1)))
            .ok_or(ConfigError::InvalidDayCount(days))?;
        return Ok(Some(DateRange { from, to: today }));
    }

    if args.to.is_some() && args.from.is_none() {
        return Err(ConfigError::MissingFromDate);
    }

    if let Some(ref from_str) = args.from {
        let from = parse_date(from_str)?;
        let to = match &args.to {
            Some(to_str) => parse_date(to_str)?,
            None => today,
        };

        if from > to {
            return Err(ConfigError::InvalidDateRange);
        }

        return Ok(Some(DateRange { from, to }));
    }

    // no filter: import everything
    Ok(None)
}

fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDateFormat(s.to_string()))
}
