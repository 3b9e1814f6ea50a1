//! Pipeline configuration from environment variables

use std::env;
use std::time::Duration;

pub const DEFAULT_WINDOW_DURATIONS_SECS: [u64; 2] = [10, 60];

/// Configuration for the aggregation side of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// One aggregation window (and scheduler) per duration
    pub window_durations: Vec<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_durations: DEFAULT_WINDOW_DURATIONS_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `WINDOW_DURATIONS_SECS` (default: 10,60)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let raw = match lookup("WINDOW_DURATIONS_SECS") {
            Some(raw) => raw,
            None => return Self::default(),
        };

        let mut window_durations: Vec<Duration> = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match entry.parse::<u64>() {
                Ok(0) => log::warn!("Ignoring zero window duration"),
                Ok(secs) => {
                    let duration = Duration::from_secs(secs);
                    if !window_durations.contains(&duration) {
                        window_durations.push(duration);
                    }
                }
                Err(_) => log::warn!("Ignoring invalid window duration '{}'", entry),
            }
        }

        if window_durations.is_empty() {
            log::warn!(
                "WINDOW_DURATIONS_SECS '{}' has no usable entries, defaulting to {:?}",
                raw,
                DEFAULT_WINDOW_DURATIONS_SECS
            );
            return Self::default();
        }

        Self { window_durations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::from_lookup(lookup(&[]));
        assert_eq!(
            config.window_durations,
            vec![Duration::from_secs(10), Duration::from_secs(60)]
        );
    }

    #[test]
    fn test_custom_durations() {
        let config = PipelineConfig::from_lookup(lookup(&[("WINDOW_DURATIONS_SECS", "5, 30,300")]));
        assert_eq!(
            config.window_durations,
            vec![Duration::from_secs(5), Duration::from_secs(30), Duration::from_secs(300)]
        );
    }

    #[test]
    fn test_invalid_entries_dropped() {
        let config = PipelineConfig::from_lookup(lookup(&[("WINDOW_DURATIONS_SECS", "0,abc,15,15,")]));
        assert_eq!(config.window_durations, vec![Duration::from_secs(15)]);
    }

    #[test]
    fn test_all_invalid_falls_back_to_default() {
        let config = PipelineConfig::from_lookup(lookup(&[("WINDOW_DURATIONS_SECS", "0,-5")]));
        assert_eq!(config, PipelineConfig::default());
    }
}
