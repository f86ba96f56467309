//! Connection parameters and their connection-string form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CedarError, Result};

/// Default PostgreSQL port.
pub const DEFAULT_PORT: u16 = 5432;

const ENV_HOST: &str = "PGHOST";
const ENV_PORT: &str = "PGPORT";
const ENV_DBNAME: &str = "PGDATABASE";
const ENV_USER: &str = "PGUSER";
const ENV_PASSWORD: &str = "PGPASSWORD";

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Where and as whom to connect.
///
/// Values are used as given: nothing is validated or escaped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the key=value connection string.
    ///
    /// # Example
    /// ```
    /// use cedar_client::ConnectionParams;
    ///
    /// let params = ConnectionParams::new("localhost", "testdb", "admin", "secret").with_port(1234);
    /// assert_eq!(
    ///     params.to_uri(),
    ///     "host=localhost port=1234 dbname=testdb user=admin password=secret"
    /// );
    /// ```
    pub fn to_uri(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.dbname, self.user, self.password
        )
    }

    /// Reads the libpq environment variables (`PGHOST`, `PGPORT`, `PGDATABASE`,
    /// `PGUSER`, `PGPASSWORD`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds parameters from an arbitrary key lookup using the libpq variable names.
    ///
    /// Missing values fall back to `localhost`, 5432, `postgres`, the user name as
    /// database, and an empty password.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(ENV_PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                CedarError::InvalidArgument(format!("{ENV_PORT}={raw:?} is not a valid port: {e}"))
            })?,
            None => DEFAULT_PORT,
        };
        let user = lookup(ENV_USER).unwrap_or_else(|| "postgres".to_string());
        let dbname = lookup(ENV_DBNAME).unwrap_or_else(|| user.clone());

        Ok(Self {
            host: lookup(ENV_HOST).unwrap_or_else(|| "localhost".to_string()),
            port,
            dbname,
            user,
            password: lookup(ENV_PASSWORD).unwrap_or_default(),
        })
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
