//! Database settings and pool construction shared by the suite binaries.

use std::{fmt, time::Duration};

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// Pooled connection handle. A connection is checked out for each statement
/// and handed back when the statement finishes, whether it succeeded or not.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("missing database setting {0}")]
    MissingSetting(&'static str),
    #[error("invalid database setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
    #[error("database connection failed: {0}")]
    Connect(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_NAME: &str = "hr_project";
const DEFAULT_USER: &str = "postgres";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Connection parameters, built once at startup and handed to [`connect`].
///
/// `url` wins when present; otherwise the discrete host/port/name/user/password
/// fields are assembled into a Postgres URL. `password` has no default.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.to_string(),
            user: DEFAULT_USER.to_string(),
            password: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl DatabaseSettings {
    /// Settings pointing at an explicit URL, e.g. `sqlite::memory:` in tests.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Build settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Ok(Self {
            url: get("DATABASE_URL"),
            host: get("DB_HOST").unwrap_or(defaults.host),
            port: parse_setting("DB_PORT", get("DB_PORT"))?.unwrap_or(defaults.port),
            name: get("DB_NAME").unwrap_or(defaults.name),
            user: get("DB_USER").unwrap_or(defaults.user),
            password: get("DB_PASSWORD"),
            max_connections: parse_setting("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"))?
                .unwrap_or(defaults.max_connections),
            connect_timeout_secs: parse_setting(
                "DB_CONNECT_TIMEOUT_SECS",
                get("DB_CONNECT_TIMEOUT_SECS"),
            )?
            .unwrap_or(defaults.connect_timeout_secs),
        })
    }

    pub fn database_url(&self) -> DbResult<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        let password = self
            .password
            .as_deref()
            .ok_or(DbError::MissingSetting("DB_PASSWORD"))?;
        let raw = format!("postgres://{}:{}/{}", self.host, self.port, self.name);
        let mut url = Url::parse(&raw).map_err(|err| DbError::InvalidSetting {
            key: "DB_HOST",
            reason: err.to_string(),
        })?;
        url.set_username(&self.user)
            .map_err(|_| DbError::InvalidSetting {
                key: "DB_USER",
                reason: "cannot be encoded in a URL".into(),
            })?;
        url.set_password(Some(password))
            .map_err(|_| DbError::InvalidSetting {
                key: "DB_PASSWORD",
                reason: "cannot be encoded in a URL".into(),
            })?;
        Ok(url.to_string())
    }

    pub fn connect_options(&self) -> DbResult<ConnectOptions> {
        if self.max_connections == 0 {
            return Err(DbError::InvalidSetting {
                key: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }
        let url = self.database_url()?;
        let in_memory = is_in_memory_sqlite(&url);
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(self.max_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .sqlx_logging(false);
        // Each in-memory SQLite connection is its own database.
        if in_memory {
            options.max_connections(1).min_connections(1);
        }
        Ok(options)
    }
}

fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}

fn parse_setting<T>(key: &'static str, raw: Option<String>) -> DbResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|err| DbError::InvalidSetting {
            key,
            reason: err.to_string(),
        })
    })
    .transpose()
}

/// Open the shared pool described by `settings`.
pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let options = settings.connect_options()?;
    let max_connections = options.get_max_connections();
    let pool = Database::connect(options).await.inspect_err(|err| {
        warn!(error = %err, host = %settings.host, "database connection failed");
    })?;
    info!(
        backend = ?pool.get_database_backend(),
        max_connections = ?max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Cheap liveness check used by the health endpoint.
pub async fn ping(pool: &DbPool) -> bool {
    pool.ping().await.is_ok()
}
