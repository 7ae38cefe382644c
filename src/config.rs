// config.rs

use crate::host::{CENTER_PAN, DEFAULT_PPQ};
use crate::receiver::{Framing, Placement};
use crate::sender::Timing;
use config::{Config, ConfigError, Environment, File};
use log::{debug, LevelFilter};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "notebridge";
pub const ENV_PREFIX: &str = "NOTEBRIDGE";

/// Runtime settings: built-in defaults, then the config file, then
/// `NOTEBRIDGE_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub output_device: Option<String>, // Port the sender writes to
    pub input_device: Option<String>,  // Port the listener reads from
    pub channel: u8,
    pub hold_ms: u64,
    pub gap_ms: u64,
    pub marker_gap_ms: u64,
    pub ppq: u32,
    pub pan: u8,
    pub framing: Framing,
    pub log_level: LevelFilter,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_device: None,
            input_device: None,
            channel: 0,
            hold_ms: 10,
            gap_ms: 0,
            marker_gap_ms: 10,
            ppq: DEFAULT_PPQ,
            pan: CENTER_PAN,
            framing: Framing::Tagged,
            log_level: LevelFilter::Debug,
        }
    }
}

impl Settings {
    /// Loads settings. With no explicit path an optional `notebridge.toml`
    /// in the working directory is used; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Self::builder_with_defaults()?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Self::from_config(&config)
    }

    fn builder_with_defaults(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("channel", i64::from(defaults.channel))?
            .set_default("hold_ms", defaults.hold_ms as i64)?
            .set_default("gap_ms", defaults.gap_ms as i64)?
            .set_default("marker_gap_ms", defaults.marker_gap_ms as i64)?
            .set_default("ppq", i64::from(defaults.ppq))?
            .set_default("pan", i64::from(defaults.pan))?
            .set_default("framing", defaults.framing.to_string())?
            .set_default("log_level", defaults.log_level.to_string())
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let settings = Settings {
            output_device: optional_string(config, "output_device")?,
            input_device: optional_string(config, "input_device")?,
            channel: ranged(config, "channel", 0, 15)? as u8,
            hold_ms: ranged(config, "hold_ms", 0, 10_000)? as u64,
            gap_ms: ranged(config, "gap_ms", 0, 10_000)? as u64,
            marker_gap_ms: ranged(config, "marker_gap_ms", 0, 10_000)? as u64,
            ppq: ranged(config, "ppq", 1, 960_000)? as u32,
            pan: ranged(config, "pan", 0, 127)? as u8,
            framing: config
                .get_string("framing")?
                .parse()
                .map_err(ConfigError::Message)?,
            log_level: config
                .get_string("log_level")?
                .parse()
                .map_err(|_| ConfigError::Message("invalid log_level".to_string()))?,
        };

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            hold: Duration::from_millis(self.hold_ms),
            gap: Duration::from_millis(self.gap_ms),
            marker_gap: Duration::from_millis(self.marker_gap_ms),
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            channel: self.channel,
            pan: self.pan,
        }
    }
}

fn optional_string(config: &Config, key: &str) -> Result<Option<String>, ConfigError> {
    match config.get_string(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

fn ranged(config: &Config, key: &str, min: i64, max: i64) -> Result<i64, ConfigError> {
    let value = config.get_int(key)?;
    if value < min || value > max {
        return Err(ConfigError::Message(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn settings_from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let config = Settings::builder_with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Settings::from_config(&config)
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.timing(), Timing::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let settings = settings_from_toml(
            r#"
            output_device = "loopMIDI Port 2"
            channel = 3
            hold_ms = 5
            ppq = 480
            framing = "positional"
            log_level = "info"
            "#,
        )
        .unwrap();

        assert_eq!(settings.output_device.as_deref(), Some("loopMIDI Port 2"));
        assert_eq!(settings.input_device, None);
        assert_eq!(settings.channel, 3);
        assert_eq!(settings.hold_ms, 5);
        assert_eq!(settings.ppq, 480);
        assert_eq!(settings.framing, Framing::Positional);
        assert_eq!(settings.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_rejects_out_of_range_channel() {
        assert!(settings_from_toml("channel = 16").is_err());
    }

    #[test]
    fn test_rejects_unknown_framing() {
        assert!(settings_from_toml("framing = \"tagless\"").is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = std::env::temp_dir().join(format!("notebridge-{}.toml", std::process::id()));
        std::fs::write(&path, "channel = 3\nppq = 480\n").unwrap();

        std::env::set_var("NOTEBRIDGE_CHANNEL", "5");
        let result = Settings::load(Some(path.as_path()));
        std::env::remove_var("NOTEBRIDGE_CHANNEL");
        let _ = std::fs::remove_file(&path);

        let settings = result.unwrap();
        assert_eq!(settings.channel, 5);
        assert_eq!(settings.ppq, 480);
        assert_eq!(settings.hold_ms, 10);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("notebridge-does-not-exist.toml");
        assert!(Settings::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_blank_device_is_none() {
        let settings = settings_from_toml("input_device = \"\"").unwrap();
        assert_eq!(settings.input_device, None);
    }
}
