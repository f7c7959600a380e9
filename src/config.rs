//! Server configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). The storage backend is fixed for the lifetime of the process.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which storage backend serves every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Flat delimited files under the data directory.
    Csv,
    /// PostgreSQL server.
    Postgres,
    /// Embedded SQLite database file.
    Sqlite,
}

impl StorageType {
    /// Returns the configuration string for this backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "postgres" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unsupported storage type: {other}")),
        }
    }
}

/// Locations of the delimited files used by the file backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvPaths {
    /// Entries file (`data.csv`).
    pub data: PathBuf,
    /// `countries` dropdown file.
    pub countries: PathBuf,
    /// `exchanges` dropdown file.
    pub exchanges: PathBuf,
    /// `event_types` dropdown file.
    pub event_types: PathBuf,
    /// Events log file.
    pub events: PathBuf,
}

impl CsvPaths {
    /// Builds the fixed file layout inside `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            data: data_dir.join("data.csv"),
            countries: data_dir.join("countries.csv"),
            exchanges: data_dir.join("exchanges.csv"),
            event_types: data_dir.join("event_types.csv"),
            events: data_dir.join("events.csv"),
        }
    }
}

/// Connection settings for the PostgreSQL backend.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresSettings {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
}

impl PostgresSettings {
    /// Renders the settings as a `postgres://` connection URL.
    ///
    /// User, password and database are percent-encoded, so characters such
    /// as `@`, `/` or `:` survive the round trip through the URL parser.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            percent_encode(&self.user),
            percent_encode(&self.password),
            self.host,
            self.port,
            percent_encode(&self.database)
        )
    }
}

/// Percent-encodes every byte outside the RFC 3986 unreserved set.
fn percent_encode(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

impl fmt::Debug for PostgresSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:5001`).
    pub listen_addr: SocketAddr,

    /// How many successive ports to try when the configured one is busy.
    pub port_fallback_attempts: u16,

    /// Selected storage backend.
    pub storage_type: StorageType,

    /// Directory holding the delimited files.
    pub data_dir: PathBuf,

    /// PostgreSQL connection settings.
    pub postgres: PostgresSettings,

    /// SQLite database file.
    pub sqlite_file: PathBuf,

    /// Maximum number of pooled database connections.
    pub database_max_connections: u32,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed as a
    /// [`SocketAddr`] or `STORAGE_TYPE` names an unknown backend.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5001".to_string())
            .parse()?;
        let port_fallback_attempts = parse_env("PORT_FALLBACK_ATTEMPTS", 10);

        let storage_type: StorageType = std::env::var("STORAGE_TYPE")
            .unwrap_or_else(|_| "csv".to_string())
            .parse()?;

        let data_dir = PathBuf::from(env_or("DATA_DIR", "data"));

        let postgres = PostgresSettings {
            host: env_or("DB_HOST", "localhost"),
            port: parse_env("DB_PORT", 5432),
            database: env_or("DB_NAME", "events_db"),
            user: env_or("DB_USER", "postgres"),
            password: env_or("DB_PASSWORD", "postgres"),
        };

        let sqlite_file = std::env::var("SQLITE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("events.db"));

        let database_max_connections = parse_env("DATABASE_MAX_CONNECTIONS", 10);

        Ok(Self {
            listen_addr,
            port_fallback_attempts,
            storage_type,
            data_dir,
            postgres,
            sqlite_file,
            database_max_connections,
        })
    }

    /// File layout of the delimited-file backend.
    #[must_use]
    pub fn csv_paths(&self) -> CsvPaths {
        CsvPaths::in_dir(&self.data_dir)
    }
}

/// Returns the variable's value, or `default` when unset.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
