use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CLEANUP_MAX_AGE_HOURS: u64 = 24 * 7;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_EXPORT_ROLE: &str = "oficial";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Process settings, read from the environment (and `.env` via dotenvy in `main`).
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Register commands on this guild only; global registration when unset.
    pub guild_id: Option<u64>,
    pub data_dir: PathBuf,
    pub cleanup_max_age_hours: u64,
    pub cleanup_interval_secs: u64,
    pub export_role: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        Ok(Self {
            discord_token,
            guild_id: parse_opt("GUILD_ID", get("GUILD_ID"))?,
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            cleanup_max_age_hours: parse_opt("POLL_CLEANUP_MAX_AGE_HOURS", get("POLL_CLEANUP_MAX_AGE_HOURS"))?
                .unwrap_or(DEFAULT_CLEANUP_MAX_AGE_HOURS),
            cleanup_interval_secs: parse_opt("POLL_CLEANUP_INTERVAL_SECS", get("POLL_CLEANUP_INTERVAL_SECS"))?
                .unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS),
            export_role: get("EXPORT_ROLE")
                .map(|role| role.to_lowercase())
                .unwrap_or_else(|| DEFAULT_EXPORT_ROLE.to_string()),
        })
    }
}

fn parse_opt<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| v.parse().map_err(|_| ConfigError::Invalid { name, value: v.clone() }))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.discord_token, "abc");
        assert_eq!(config.guild_id, None);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.cleanup_max_age_hours, 168);
        assert_eq!(config.cleanup_interval_secs, 3600);
        assert_eq!(config.export_role, "oficial");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("GUILD_ID", "123456"),
            ("DATA_DIR", "/var/lib/survey"),
            ("POLL_CLEANUP_MAX_AGE_HOURS", "48"),
            ("EXPORT_ROLE", "Admin"),
        ]))
        .unwrap();
        assert_eq!(config.guild_id, Some(123456));
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/survey"));
        assert_eq!(config.cleanup_max_age_hours, 48);
        assert_eq!(config.export_role, "admin");
    }

    #[test]
    fn missing_token_and_bad_numbers_fail() {
        assert!(matches!(
            Config::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("DISCORD_TOKEN"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("DISCORD_TOKEN", "abc"), ("GUILD_ID", "not-a-number")])),
            Err(ConfigError::Invalid { name: "GUILD_ID", .. })
        ));
    }
}
