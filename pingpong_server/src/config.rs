use std::{env, time::Duration};

use log::*;
use pingpong_engine::{db_types::DEFAULT_MATCH_TYPE, rules::RuleTable};

const DEFAULT_PP_HOST: &str = "127.0.0.1";
const DEFAULT_PP_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/pingpong.db";
const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How long a socket may stay silent before the server sends it an application-level `ping` envelope.
    pub keepalive: Duration,
    /// The match format used for snapshots whose `match_type` is not in the rule table.
    pub default_match_type: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PP_HOST.to_string(),
            port: DEFAULT_PP_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            keepalive: DEFAULT_KEEPALIVE,
            default_match_type: DEFAULT_MATCH_TYPE.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PP_HOST").ok().unwrap_or_else(|| DEFAULT_PP_HOST.into());
        let port = env::var("PP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for PP_PORT. {e} Using the default, {DEFAULT_PP_PORT}, instead.");
                    DEFAULT_PP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PP_PORT);
        let database_url = env::var("PP_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PP_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let keepalive = configure_keepalive();
        let default_match_type = env::var("PP_DEFAULT_MATCH_TYPE").ok().unwrap_or_else(|| {
            info!("🪛️ PP_DEFAULT_MATCH_TYPE is not set. Using {DEFAULT_MATCH_TYPE}.");
            DEFAULT_MATCH_TYPE.to_string()
        });
        let use_x_forwarded_for = env_flag("PP_USE_X_FORWARDED_FOR");
        let use_forwarded = env_flag("PP_USE_FORWARDED");
        Self { host, port, database_url, keepalive, default_match_type, use_x_forwarded_for, use_forwarded }
    }

    /// The rule table the server scores matches with. An unknown default type is logged and ignored.
    pub fn rule_table(&self) -> RuleTable {
        RuleTable::default().with_default_type(&self.default_match_type)
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|s| parse_flag(&s)).unwrap_or(false)
}

fn parse_flag(s: &str) -> bool {
    s == "1" || s.eq_ignore_ascii_case("true")
}

fn parse_keepalive(s: &str) -> Option<Duration> {
    match s.parse::<u64>() {
        Ok(0) => {
            warn!("🪛️ PP_KEEPALIVE_SECS must be greater than zero.");
            None
        },
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!("🪛️ Invalid configuration value for PP_KEEPALIVE_SECS. {e}");
            None
        },
    }
}

fn configure_keepalive() -> Duration {
    env::var("PP_KEEPALIVE_SECS")
        .map_err(|_| {
            info!(
                "🪛️ PP_KEEPALIVE_SECS is not set. Using the default value of {}s.",
                DEFAULT_KEEPALIVE.as_secs()
            )
        })
        .ok()
        .and_then(|s| parse_keepalive(&s))
        .unwrap_or(DEFAULT_KEEPALIVE)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude anything that handlers don't need.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub keepalive: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            keepalive: config.keepalive,
        }
    }
}
