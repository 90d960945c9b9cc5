use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const PERIOD_ENV: &str = "LOAD_REFRESH_PERIOD_MS";
pub const STALE_DATA_IS_ERROR_ENV: &str = "LOAD_STALE_DATA_IS_ERROR";

/// Tunables of a [`LoadController`](super::LoadController).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Refresh period. `None` or zero disables polling.
    pub period: Option<Duration>,
    /// When set, a failed refresh renders the error view instead of keeping the
    /// previously loaded value on screen.
    pub stale_data_is_error: bool,
}

impl LoadConfig {
    /// Builds the configuration from the environment, falling back to the defaults for
    /// missing variables.
    ///
    /// - `LOAD_REFRESH_PERIOD_MS`: refresh period in milliseconds, `0` or negative disables polling
    /// - `LOAD_STALE_DATA_IS_ERROR`: `true`/`false` (also `1`/`0`, `yes`/`no`, `on`/`off`)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(period) = std::env::var(PERIOD_ENV) {
            config.period = parse_period_ms(&period)?;
        }
        if let Ok(flag) = std::env::var(STALE_DATA_IS_ERROR_ENV) {
            config.stale_data_is_error = parse_flag(&flag)?;
        }
        log::debug!("LoadConfig::from_env - {config:?}");
        Ok(config)
    }
}

/// Positive period or nothing.
pub(crate) fn normalize_period(period: Option<Duration>) -> Option<Duration> {
    period.filter(|p| !p.is_zero())
}

fn parse_period_ms(raw: &str) -> Result<Option<Duration>> {
    let ms: i64 = raw
        .trim()
        .parse()
        .map_err(|e| Error::InvalidConfig(format!("{PERIOD_ENV}={raw:?}: {e}").into()))?;
    Ok(u64::try_from(ms)
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis))
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig(
            format!("{STALE_DATA_IS_ERROR_ENV}={raw:?}: expected a boolean").into(),
        )),
    }
}
