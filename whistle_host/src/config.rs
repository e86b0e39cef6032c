use std::path::Path;

use anyhow::{Context, Result};
use micro_whistle::midi::EmitterConfig;
use micro_whistle::resynth::ResynthConfig;
use serde::{Deserialize, Serialize};

/// Options read from a JSON file. Missing fields keep their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub emitter: EmitterConfig,
    pub resynth: ResynthConfig,
}

impl HostConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                let config: HostConfig = serde_json::from_str(&json)
                    .with_context(|| format!("Invalid config file {}", path.display()))?;
                log::info!("Loaded config from {}", path.display());
                config
            }
            None => HostConfig::default(),
        };
        config.emitter.validate()?;
        config.resynth.validate()?;
        log::debug!("{:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use micro_whistle::midi::Velocity;

    #[test]
    fn test_partial_config() {
        let json = r#"{ "emitter": { "transpose": -12, "velocity": "loudness" } }"#;
        let config: HostConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.emitter.transpose, -12);
        assert_eq!(config.emitter.velocity, Velocity::Loudness);
        assert_eq!(config.emitter.gate_threshold, EmitterConfig::default().gate_threshold);
        assert_eq!(config.resynth, ResynthConfig::default());
    }

    #[test]
    fn test_invalid_config_file() {
        let path = std::env::temp_dir().join("whistle_host_config_test.json");
        std::fs::write(&path, r#"{ "emitter": { "channel": 16 } }"#).unwrap();
        assert!(HostConfig::load(Some(&path)).is_err());
        std::fs::remove_file(&path).unwrap();
        assert_eq!(HostConfig::load(None).unwrap(), HostConfig::default());
    }
}
