use anyhow::{bail, Context, Result};
use clap::Parser;
use medianalyze_core::{default_log_level, DatabaseConfig, DatabaseLocation};
use std::path::PathBuf;

/// Verifies the MediAnalyze Pro persistence layer end to end.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// SQLite file to verify; overrides MEDIANALYZE_DB_PATH
    #[arg(long, conflicts_with = "in_memory")]
    pub db_path: Option<PathBuf>,

    /// Run against a throwaway in-memory store
    #[arg(long)]
    pub in_memory: bool,

    /// Directory for rolling log files, relative to the working directory
    /// unless absolute; no file logging when omitted
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error); build default when omitted
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Resolves the store configuration: flags first, then the environment.
    pub fn database_config(&self) -> Result<DatabaseConfig> {
        let mut config = DatabaseConfig::from_env()
            .context("failed to read database settings from environment")?;
        if self.in_memory {
            config.location = DatabaseLocation::Memory;
        } else if let Some(path) = &self.db_path {
            if path.as_os_str().is_empty() {
                bail!("--db-path cannot be empty");
            }
            config.location = DatabaseLocation::File(path.clone());
        }
        Ok(config)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use medianalyze_core::{resolve_log_dir, DatabaseLocation};
    use std::path::{Path, PathBuf};

    #[test]
    fn in_memory_flag_selects_memory_store() {
        let cli = Cli::parse_from(["medianalyze", "--in-memory"]);
        let config = cli.database_config().unwrap();
        assert_eq!(config.location, DatabaseLocation::Memory);
    }

    #[test]
    fn db_path_flag_selects_file_store() {
        let cli = Cli::parse_from(["medianalyze", "--db-path", "/tmp/medianalyze-cli.db"]);
        let config = cli.database_config().unwrap();
        assert_eq!(
            config.location,
            DatabaseLocation::File(PathBuf::from("/tmp/medianalyze-cli.db"))
        );
    }

    #[test]
    fn db_path_and_in_memory_conflict() {
        let result = Cli::try_parse_from(["medianalyze", "--in-memory", "--db-path", "x.db"]);
        assert!(result.is_err());
    }

    #[test]
    fn explicit_log_level_wins() {
        let cli = Cli::parse_from(["medianalyze", "--log-level", "warn"]);
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn relative_log_dir_resolves_under_working_directory() {
        let cli = Cli::parse_from(["medianalyze", "--log-dir", "logs"]);
        let log_dir = cli.log_dir.as_deref().unwrap();
        assert_eq!(log_dir, Path::new("logs"));
        assert_eq!(
            resolve_log_dir(log_dir).unwrap(),
            std::env::current_dir().unwrap().join("logs")
        );
    }
}
