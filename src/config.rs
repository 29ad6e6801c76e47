use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::models::Profile;

const BIND_ADDR: &str = "BIND_ADDR";
const EVENT_ID_LEN: &str = "EVENT_ID_LEN";
const EVENT_CAPTION_MAX_LEN: &str = "EVENT_CAPTION_MAX_LEN";
const DANCER_NAME_MAX_LEN: &str = "DANCER_NAME_MAX_LEN";
const RENDER_REPEATS: &str = "RENDER_REPEATS";
const RENDER_QUEUE_CAPACITY: &str = "RENDER_QUEUE_CAPACITY";
const RERENDER_ON_STARTUP: &str = "RERENDER_ON_STARTUP";
const RENDER_WEBHOOK_URL: &str = "RENDER_WEBHOOK_URL";
const NOTIFY_WEBHOOK_URL: &str = "NOTIFY_WEBHOOK_URL";
const SYSTEM_PROFILE_ID: &str = "SYSTEM_PROFILE_ID";
const SYSTEM_PROFILE_NAME: &str = "SYSTEM_PROFILE_NAME";
const SYSTEM_PROFILE_HANDLE: &str = "SYSTEM_PROFILE_HANDLE";
const LOG_LEVEL: &str = "LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub event_id_len: usize,
    pub event_caption_max_len: usize,
    pub dancer_name_max_len: usize,
    /// Delays of the repeat renders after each change
    pub render_repeats: Vec<Duration>,
    pub render_queue_capacity: usize,
    /// Published events saved within this window are re-rendered at startup
    pub rerender_on_startup: Duration,
    pub render_webhook_url: Option<String>,
    pub notify_webhook_url: Option<String>,
    /// Initiator of auto-pair actions
    pub system_profile: Profile,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "127.0.0.1:8080".to_string(),
            event_id_len: 12,
            event_caption_max_len: 2048,
            dancer_name_max_len: 64,
            render_repeats: [2, 10, 60, 3600].into_iter().map(Duration::from_secs).collect(),
            render_queue_capacity: 64,
            rerender_on_startup: Duration::from_secs(43200),
            render_webhook_url: None,
            notify_webhook_url: None,
            system_profile: Profile::new(0, "signup-bot"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_from_env() -> Result<Config, String> {
        // Load .env file
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let render_repeats = match var(RENDER_REPEATS) {
            Some(raw) => parse_seconds_list(&raw)
                .map_err(|e| format!("failed to parse {}: {}", RENDER_REPEATS, e))?,
            None => defaults.render_repeats,
        };

        let mut system_profile = Profile::new(
            parse_or(var(SYSTEM_PROFILE_ID), SYSTEM_PROFILE_ID, defaults.system_profile.id)?,
            var(SYSTEM_PROFILE_NAME).unwrap_or(defaults.system_profile.first_name),
        );
        if let Some(handle) = var(SYSTEM_PROFILE_HANDLE) {
            system_profile = system_profile.with_handle(handle.trim_start_matches('@'));
        }

        Ok(Config {
            bind_addr: var(BIND_ADDR).unwrap_or(defaults.bind_addr),
            event_id_len: parse_or(var(EVENT_ID_LEN), EVENT_ID_LEN, defaults.event_id_len)?,
            event_caption_max_len: parse_or(
                var(EVENT_CAPTION_MAX_LEN),
                EVENT_CAPTION_MAX_LEN,
                defaults.event_caption_max_len,
            )?,
            dancer_name_max_len: parse_or(
                var(DANCER_NAME_MAX_LEN),
                DANCER_NAME_MAX_LEN,
                defaults.dancer_name_max_len,
            )?,
            render_repeats,
            render_queue_capacity: parse_or(
                var(RENDER_QUEUE_CAPACITY),
                RENDER_QUEUE_CAPACITY,
                defaults.render_queue_capacity,
            )?,
            rerender_on_startup: Duration::from_secs(parse_or(
                var(RERENDER_ON_STARTUP),
                RERENDER_ON_STARTUP,
                defaults.rerender_on_startup.as_secs(),
            )?),
            render_webhook_url: var(RENDER_WEBHOOK_URL),
            notify_webhook_url: var(NOTIFY_WEBHOOK_URL),
            system_profile,
            log_level: var(LOG_LEVEL).unwrap_or(defaults.log_level),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, String> {
    match raw {
        Some(v) => v
            .parse()
            .map_err(|_| format!("failed to parse environment variable {}: {:?}", key, v)),
        None => Ok(default),
    }
}

fn parse_seconds_list(raw: &str) -> Result<Vec<Duration>, String> {
    raw.split(',')
        .map(|s| {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| format!("invalid number of seconds: {:?}", trimmed))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.event_id_len, 12);
        assert_eq!(config.render_repeats.len(), 4);
        assert_eq!(config.render_repeats[0], Duration::from_secs(2));
        assert_eq!(config.rerender_on_startup, Duration::from_secs(43200));
        assert_eq!(config.system_profile.id, 0);
        assert!(config.render_webhook_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (RENDER_REPEATS, " 1, 5 "),
            (SYSTEM_PROFILE_ID, "42"),
            (SYSTEM_PROFILE_NAME, "Dance Bot"),
            (SYSTEM_PROFILE_HANDLE, "@dance_bot"),
            (NOTIFY_WEBHOOK_URL, "http://localhost:9000/notify"),
        ]))
        .unwrap();
        assert_eq!(
            config.render_repeats,
            vec![Duration::from_secs(1), Duration::from_secs(5)]
        );
        assert_eq!(config.system_profile.id, 42);
        assert_eq!(config.system_profile.handle(), Some("dance_bot"));
        assert_eq!(config.notify_webhook_url.as_deref(), Some("http://localhost:9000/notify"));
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup(&[(EVENT_ID_LEN, "twelve")])).unwrap_err();
        assert!(err.contains(EVENT_ID_LEN));
    }
}
