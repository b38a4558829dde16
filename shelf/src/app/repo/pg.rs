use serde::Serialize;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::time::Duration;
use tracing::{error, info, warn};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres connection parameters.
#[derive(Debug, Clone, Serialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
    pub user: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: None,
            user: None,
            password: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl DbConfig {
    /// Read the configuration from `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER` and `DB_PASSWORD`.
    /// Unset variables fall back to the postgres defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match var("DB_PORT") {
            Some(port) => port.parse().unwrap_or_else(|e| {
                warn!("Invalid DB_PORT '{port}' ({e}), using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        Self {
            host: var("DB_HOST").unwrap_or(defaults.host),
            port,
            database: var("DB_NAME"),
            user: var("DB_USER"),
            password: var("DB_PASSWORD"),
            connect_timeout: defaults.connect_timeout,
        }
    }

    fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new().host(&self.host).port(self.port);

        if let Some(ref database) = self.database {
            options = options.database(database);
        }
        if let Some(ref user) = self.user {
            options = options.username(user);
        }
        if let Some(ref password) = self.password {
            options = options.password(password);
        }

        options
    }
}

/// Connect to postgres. Errors are logged and result in `None`.
pub async fn get_db_connection(config: &DbConfig) -> Option<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(config.connect_options())
        .await;

    match pool {
        Ok(pool) => {
            info!("Connected to postgres at {}:{}", config.host, config.port);
            Some(pool)
        }
        Err(e) => {
            error!("Error connecting to PostgreSQL: {e}");
            None
        }
    }
}

/// Close the connection, if any.
pub async fn close_db_connection(pool: Option<PgPool>) {
    if let Some(pool) = pool {
        pool.close().await;
        info!("Closed postgres connection");
    }
}
