use std::str::FromStr;
use std::time::Duration;

use vitalwatch_events::delivery::telegram::DEFAULT_API_URL as DEFAULT_TELEGRAM_URL;
use vitalwatch_events::dispatcher::DEFAULT_QUEUE_CAPACITY;

use crate::error::MonitorError;
use crate::geocode::DEFAULT_GEOCODER_URL;
use crate::insight::gemini::DEFAULT_MODEL;

/// Shortest usable history window; trends need two points.
const MIN_HISTORY_WINDOW: usize = 2;

/// Monitor configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local session.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub vitals_interval: Duration,
    pub compliance_interval: Duration,
    /// Length of every vital history window.
    pub history_window: usize,
    pub sos_countdown_secs: u32,
    pub test_countdown_secs: u32,
    /// Delay before the insight request that follows an SOS trigger.
    pub insight_delay: Duration,
    pub notification_queue_capacity: usize,
    /// Enables the Gemini insight generator when set.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub telegram_api_url: String,
    pub geocoder_url: String,
    pub profile_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            vitals_interval: Duration::from_millis(2000),
            compliance_interval: Duration::from_secs(10),
            history_window: 20,
            sos_countdown_secs: 10,
            test_countdown_secs: 5,
            insight_delay: Duration::from_millis(1000),
            notification_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.into(),
            telegram_api_url: DEFAULT_TELEGRAM_URL.into(),
            geocoder_url: DEFAULT_GEOCODER_URL.into(),
            profile_path: "vitalwatch-profile.json".into(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                               |
    /// |-------------------------------|---------------------------------------|
    /// | `VITALS_INTERVAL_MS`          | `2000`                                |
    /// | `COMPLIANCE_INTERVAL_SECS`    | `10`                                  |
    /// | `HISTORY_WINDOW`              | `20`                                  |
    /// | `SOS_COUNTDOWN_SECS`          | `10`                                  |
    /// | `TEST_COUNTDOWN_SECS`         | `5`                                   |
    /// | `INSIGHT_DELAY_MS`            | `1000`                                |
    /// | `NOTIFICATION_QUEUE_CAPACITY` | `50`                                  |
    /// | `GEMINI_API_KEY`              | unset                                 |
    /// | `GEMINI_MODEL`                | `gemini-2.5-flash-lite`               |
    /// | `TELEGRAM_API_URL`            | `https://api.telegram.org`            |
    /// | `GEOCODER_URL`                | `https://nominatim.openstreetmap.org` |
    /// | `PROFILE_PATH`                | `vitalwatch-profile.json`             |
    pub fn from_env() -> Result<Self, MonitorError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MonitorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let vitals_ms: u64 = parse_var(&lookup, "VITALS_INTERVAL_MS", 2000)?;
        let compliance_secs: u64 = parse_var(&lookup, "COMPLIANCE_INTERVAL_SECS", 10)?;
        let insight_ms: u64 = parse_var(&lookup, "INSIGHT_DELAY_MS", 1000)?;
        if vitals_ms == 0 || compliance_secs == 0 {
            return Err(MonitorError::Config(
                "tick intervals must be greater than zero".into(),
            ));
        }

        let history_window: usize = parse_var(&lookup, "HISTORY_WINDOW", defaults.history_window)?;
        if history_window < MIN_HISTORY_WINDOW {
            return Err(MonitorError::Config(format!(
                "HISTORY_WINDOW must be at least {MIN_HISTORY_WINDOW}"
            )));
        }

        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        Ok(Self {
            vitals_interval: Duration::from_millis(vitals_ms),
            compliance_interval: Duration::from_secs(compliance_secs),
            history_window,
            sos_countdown_secs: parse_var(&lookup, "SOS_COUNTDOWN_SECS", defaults.sos_countdown_secs)?,
            test_countdown_secs: parse_var(
                &lookup,
                "TEST_COUNTDOWN_SECS",
                defaults.test_countdown_secs,
            )?,
            insight_delay: Duration::from_millis(insight_ms),
            notification_queue_capacity: parse_var(
                &lookup,
                "NOTIFICATION_QUEUE_CAPACITY",
                defaults.notification_queue_capacity,
            )?,
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            telegram_api_url: lookup("TELEGRAM_API_URL").unwrap_or(defaults.telegram_api_url),
            geocoder_url: lookup("GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            profile_path: lookup("PROFILE_PATH").unwrap_or(defaults.profile_path),
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, MonitorError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| MonitorError::Config(format!("{name} must be a valid number, got {raw:?}"))),
    }
}
