//! Runtime configuration (SPEC_FULL §6).

use std::path::PathBuf;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Our own version, used as the osu! API client's user agent version.
    pub static ref VERSION: String = env!("CARGO_PKG_VERSION").to_string();
}

/// User-Agent header for outgoing API requests.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Engine config, read from the TOML file named by `RANKDATE_CONFIG`, plus
/// the `CLIENT_ID`/`CLIENT_SECRET` environment variables (SPEC_FULL §6:
/// credentials live in the environment, separately from the TOML file).
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Connection string for the beatmap set store, libpq-style, f.e.
    /// `host=127.0.0.1 port=5432 user=postgres password=123 connect_timeout=10`.
    ///
    /// Reference: https://www.postgresql.org/docs/9.3/libpq-connect.html#LIBPQ-CONNSTRING
    pub postgres_connection: String,

    /// Base URL of the osu! API, f.e. `https://osu.ppy.sh/api/v2`.
    pub api_base_url: String,

    /// osu! OAuth client id, read from the `CLIENT_ID` env var.
    #[serde(skip)]
    pub client_id: u32,

    /// osu! OAuth client secret, read from the `CLIENT_SECRET` env var.
    #[serde(skip)]
    pub client_secret: String,
}

impl Config {
    /// Read the config file listed in the `RANKDATE_CONFIG` environment
    /// variable, then overlay the `CLIENT_ID`/`CLIENT_SECRET` env vars.
    ///
    /// # Panics
    /// - when `RANKDATE_CONFIG` is not set
    /// - when `RANKDATE_CONFIG` does not point to a valid TOML config
    /// - when the file cannot be parsed
    /// - when `CLIENT_ID` or `CLIENT_SECRET` is not set, or `CLIENT_ID` is
    ///   not a valid integer
    pub fn load() -> Config {
        let f = Self::path()
            .unwrap_or_else(|| panic!("cannot locate config: use the '{}' env var", CONFIG_ENV_VAR));
        let f_str = std::fs::read_to_string(f).expect("failed to read config file");
        let mut config: Config = toml::from_str(&f_str).expect("failed to parse config file");

        config.client_id = std::env::var("CLIENT_ID")
            .expect("missing 'CLIENT_ID' env var")
            .parse()
            .expect("'CLIENT_ID' env var must be an integer");
        config.client_secret = std::env::var("CLIENT_SECRET").expect("missing 'CLIENT_SECRET' env var");

        config
    }

    fn path() -> Option<PathBuf> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(f) => Some(PathBuf::from(f)).filter(|p| p.is_file()),
            Err(_) => None,
        }
    }
}

const CONFIG_ENV_VAR: &str = "RANKDATE_CONFIG";
