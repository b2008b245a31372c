//! Runtime configuration.
//!
//! The store location comes from the `DATABASE_URL` environment variable
//! (a `sqlite://` URL or a bare filesystem path), overridable from the
//! CLI. A missing location is fatal at startup; the gateways cannot be
//! constructed without a store.

use anyhow::{Result, bail};
use std::path::PathBuf;

/// Default port for the web UI.
pub const DEFAULT_PORT: u16 = 7150;

#[derive(Debug, Clone)]
pub struct Config {
    /// Filesystem path of the SQLite database.
    pub database_path: PathBuf,
    /// Port the web UI listens on.
    pub port: u16,
}

impl Config {
    /// Resolve configuration: CLI flags win over the environment.
    pub fn resolve(db_flag: Option<PathBuf>, port_flag: Option<u16>) -> Result<Self> {
        let database_path = match db_flag {
            Some(path) => path,
            None => match std::env::var("DATABASE_URL") {
                Ok(url) => parse_database_url(&url)?,
                Err(_) => bail!(
                    "DATABASE_URL is not set; pass --database or configure the connection string"
                ),
            },
        };

        let port = port_flag
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            database_path,
            port,
        })
    }
}

/// Accept `sqlite://path`, `sqlite:path`, or a bare path.
fn parse_database_url(url: &str) -> Result<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if path.is_empty() {
        bail!("DATABASE_URL is empty");
    }

    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_prefixes_are_stripped() {
        assert_eq!(
            parse_database_url("sqlite:///var/lib/tasks.db").unwrap(),
            PathBuf::from("/var/lib/tasks.db")
        );
        assert_eq!(
            parse_database_url("sqlite:tasks.db").unwrap(),
            PathBuf::from("tasks.db")
        );
        assert_eq!(
            parse_database_url("tasks.db").unwrap(),
            PathBuf::from("tasks.db")
        );
    }

    #[test]
    fn empty_url_is_rejected() {
        assert!(parse_database_url("").is_err());
        assert!(parse_database_url("sqlite://").is_err());
    }

    #[test]
    fn cli_flag_wins_without_env() {
        let config = Config::resolve(Some(PathBuf::from("override.db")), Some(9000)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("override.db"));
        assert_eq!(config.port, 9000);
    }
}
