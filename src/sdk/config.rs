use std::{env, num::NonZeroUsize, str::FromStr, time::Duration};
use thiserror::Error;

use super::routing::batch::{BatchPolicy, DEFAULT_BATCH_DELAY};
use super::routing::provider::remote::{DEFAULT_OSRM_BASE_URL, DEFAULT_TIMEOUT};
use super::routing::route::{FallbackPolicy, DEFAULT_MINUTES_PER_KM};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutingBackend {
    Remote { base_url: String, timeout: Duration },
    /// No network calls; every route is a straight-line estimate.
    Offline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    pub backend: RoutingBackend,
    pub fallback: FallbackPolicy,
    pub batch: BatchPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            backend: RoutingBackend::Remote {
                base_url: DEFAULT_OSRM_BASE_URL.to_string(),
                timeout: DEFAULT_TIMEOUT,
            },
            fallback: FallbackPolicy::default(),
            batch: BatchPolicy::default(),
        }
    }
}

impl RouterConfig {
    /// Reads `ROUTING_MODE`, `ROUTING_BASE_URL`, `ROUTING_TIMEOUT_SECS`,
    /// `FALLBACK_MINUTES_PER_KM`, `BATCH_DELAY_MS` and `BATCH_MAX_IN_FLIGHT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = get("ROUTING_MODE").unwrap_or_else(|| "remote".to_string());
        let backend = match mode.to_ascii_lowercase().as_str() {
            "remote" => {
                let base_url = get("ROUTING_BASE_URL").unwrap_or_else(|| DEFAULT_OSRM_BASE_URL.to_string());
                let timeout = match get("ROUTING_TIMEOUT_SECS") {
                    Some(v) => {
                        let secs: f64 = parse("ROUTING_TIMEOUT_SECS", &v)?;
                        if !(secs.is_finite() && secs > 0.0) {
                            return Err(invalid("ROUTING_TIMEOUT_SECS", &v, "must be a positive number"));
                        }
                        Duration::try_from_secs_f64(secs)
                            .map_err(|e| invalid("ROUTING_TIMEOUT_SECS", &v, &e.to_string()))?
                    }
                    None => DEFAULT_TIMEOUT,
                };
                RoutingBackend::Remote { base_url, timeout }
            }
            "offline" => RoutingBackend::Offline,
            _ => return Err(invalid("ROUTING_MODE", &mode, "expected 'remote' or 'offline'")),
        };

        let minutes_per_km = match get("FALLBACK_MINUTES_PER_KM") {
            Some(v) => {
                let m: f64 = parse("FALLBACK_MINUTES_PER_KM", &v)?;
                if !(m.is_finite() && m >= 0.0) {
                    return Err(invalid("FALLBACK_MINUTES_PER_KM", &v, "must be a non-negative number"));
                }
                m
            }
            None => DEFAULT_MINUTES_PER_KM,
        };

        let delay = match get("BATCH_DELAY_MS") {
            Some(v) => Duration::from_millis(parse("BATCH_DELAY_MS", &v)?),
            None => DEFAULT_BATCH_DELAY,
        };
        let max_in_flight = match get("BATCH_MAX_IN_FLIGHT") {
            Some(v) => parse::<NonZeroUsize>("BATCH_MAX_IN_FLIGHT", &v)?,
            None => NonZeroUsize::MIN,
        };

        Ok(Self {
            backend,
            fallback: FallbackPolicy::new(minutes_per_km),
            batch: BatchPolicy { delay, max_in_flight },
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| invalid(var, value, &e.to_string()))
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<RouterConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        RouterConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(config(&[]).unwrap(), RouterConfig::default());
    }

    #[test]
    fn reads_every_setting() {
        let cfg = config(&[
            ("ROUTING_BASE_URL", "http://osrm.local/route/v1/driving"),
            ("ROUTING_TIMEOUT_SECS", "5"),
            ("FALLBACK_MINUTES_PER_KM", "1.5"),
            ("BATCH_DELAY_MS", "200"),
            ("BATCH_MAX_IN_FLIGHT", "2"),
        ])
        .unwrap();

        assert_eq!(
            cfg.backend,
            RoutingBackend::Remote {
                base_url: "http://osrm.local/route/v1/driving".to_string(),
                timeout: Duration::from_secs(5),
            }
        );
        assert_eq!(cfg.fallback.minutes_per_km, 1.5);
        assert_eq!(cfg.batch.delay, Duration::from_millis(200));
        assert_eq!(cfg.batch.max_in_flight.get(), 2);
    }

    #[test]
    fn offline_mode() {
        assert_eq!(config(&[("ROUTING_MODE", "Offline")]).unwrap().backend, RoutingBackend::Offline);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("ROUTING_MODE", "carrier-pigeon")]).is_err());
        assert!(config(&[("BATCH_MAX_IN_FLIGHT", "0")]).is_err());
        assert!(config(&[("ROUTING_TIMEOUT_SECS", "-3")]).is_err());
        assert!(config(&[("ROUTING_TIMEOUT_SECS", "1e30")]).is_err());
        let err = config(&[("FALLBACK_MINUTES_PER_KM", "fast")]).unwrap_err();
        assert!(err.to_string().contains("FALLBACK_MINUTES_PER_KM"));
    }
}
