//! Startup configuration.
//!
//! The configuration file is line oriented `key:value`. Well-known keys tune
//! the loop; any other key that parses as an integer declares a channel id
//! with its display label:
//!
//! ```text
//! polling_speed:0.05
//! history_length:80
//! scale:3
//! north:17
//! south:27
//! 17:Joystick up
//! 27:Joystick down
//! mcp_enable:on
//! mcp_address:0x20
//! ```
//!
//! The parsed [`ScopeConfig`] is immutable and handed to every component
//! that needs it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::channel::{Bank, Channel, ChannelId, EXPANDER_BASE_ID, EXPANDER_LINES};
use crate::trajectory::{MAX_SCALE, TrajectoryAxes};

/// Default tick interval in seconds.
pub const DEFAULT_POLLING_SECS: f64 = 0.1;

/// Default number of samples retained per channel.
pub const DEFAULT_HISTORY_LENGTH: usize = 50;

/// Default trajectory scale factor.
pub const DEFAULT_SCALE: i32 = 2;

/// Smallest tick interval the loop accepts.
pub const MIN_POLLING_INTERVAL: Duration = Duration::from_millis(10);

/// Bus number used for the expander when `mcp_bus` is not given.
pub const DEFAULT_EXPANDER_BUS: u8 = 1;

/// Errors raised while reading the configuration file. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid value {value:?} for `{key}`: {reason}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
        reason: String,
    },

    #[error("line {line}: unknown key `{key}` (not a setting and not a channel id)")]
    UnknownKey { line: usize, key: String },

    #[error("line {line}: channel {id} is in the expander range but mcp_enable is off")]
    ExpanderChannelWithoutExpander { line: usize, id: u32 },

    #[error("line {line}: channel {id} is out of range")]
    ChannelOutOfRange { line: usize, id: u32 },

    #[error("mcp_enable is on but mcp_address is missing")]
    MissingExpanderAddress,

    #[error("no channels configured")]
    NoChannels,
}

/// Secondary expander group settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderConfig {
    pub address: u16,
    pub bus: u8,
}

/// Immutable configuration produced once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeConfig {
    /// Monitored channels in declaration order.
    pub channels: Vec<Channel>,
    pub polling_interval: Duration,
    pub history_length: usize,
    pub db_path: PathBuf,
    pub scale: i32,
    pub axes: TrajectoryAxes,
    pub expander: Option<ExpanderConfig>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            polling_interval: Duration::from_secs_f64(DEFAULT_POLLING_SECS),
            history_length: DEFAULT_HISTORY_LENGTH,
            db_path: PathBuf::from("."),
            scale: DEFAULT_SCALE,
            axes: TrajectoryAxes::default(),
            expander: None,
        }
    }
}

impl ScopeConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut mcp_enable = false;
        let mut mcp_address: Option<u16> = None;
        let mut mcp_bus: Option<u8> = None;
        // (line number, channel) so range errors can point at the declaration.
        let mut declared: Vec<(usize, Channel)> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            let invalid = |reason: &str| ConfigError::InvalidValue {
                line,
                key: key.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            };

            match key {
                "polling_speed" => {
                    let secs: f64 = value.parse().map_err(|_| invalid("expected seconds"))?;
                    if !secs.is_finite() || secs < 0.0 {
                        return Err(invalid("expected a non-negative number of seconds"));
                    }
                    let interval =
                        Duration::try_from_secs_f64(secs).map_err(|_| invalid("too large"))?;
                    config.polling_interval = interval.max(MIN_POLLING_INTERVAL);
                }
                "history_length" => {
                    let n: usize = value.parse().map_err(|_| invalid("expected an integer"))?;
                    if n == 0 {
                        return Err(invalid("must be at least 1"));
                    }
                    config.history_length = n;
                }
                "db_path" => config.db_path = PathBuf::from(value),
                "scale" => {
                    let scale: i32 = value.parse().map_err(|_| invalid("expected an integer"))?;
                    if !(-MAX_SCALE..=MAX_SCALE).contains(&scale) {
                        return Err(invalid("out of range"));
                    }
                    config.scale = scale;
                }
                "north" | "south" | "east" | "west" => {
                    let id: u32 = value
                        .parse()
                        .map_err(|_| invalid("expected a channel id"))?;
                    let slot = match key {
                        "north" => &mut config.axes.north,
                        "south" => &mut config.axes.south,
                        "east" => &mut config.axes.east,
                        _ => &mut config.axes.west,
                    };
                    *slot = Some(ChannelId(id));
                }
                "mcp_enable" => {
                    mcp_enable = parse_switch(value).ok_or_else(|| invalid("expected on/off"))?;
                }
                "mcp_address" => {
                    let address =
                        parse_address(value).ok_or_else(|| invalid("expected hex or decimal"))?;
                    mcp_address = Some(address);
                }
                "mcp_bus" => {
                    mcp_bus = Some(value.parse().map_err(|_| invalid("expected a bus number"))?);
                }
                other => {
                    let id: u32 = other.parse().map_err(|_| ConfigError::UnknownKey {
                        line,
                        key: other.to_string(),
                    })?;
                    let channel = Channel::new(id, value);
                    match declared.iter_mut().find(|(_, c)| c.id == channel.id) {
                        Some(existing) => existing.1.label = channel.label,
                        None => declared.push((line, channel)),
                    }
                }
            }
        }

        if mcp_enable {
            let address = mcp_address.ok_or(ConfigError::MissingExpanderAddress)?;
            config.expander = Some(ExpanderConfig {
                address,
                bus: mcp_bus.unwrap_or(DEFAULT_EXPANDER_BUS),
            });
        }

        for (line, channel) in &declared {
            let id = channel.id.get();
            if id >= EXPANDER_BASE_ID + EXPANDER_LINES {
                return Err(ConfigError::ChannelOutOfRange { line: *line, id });
            }
            if matches!(channel.bank(), Bank::Expander { .. }) && config.expander.is_none() {
                return Err(ConfigError::ExpanderChannelWithoutExpander { line: *line, id });
            }
        }
        config.channels = declared.into_iter().map(|(_, c)| c).collect();

        // The whole expander group is monitored once enabled; explicit entries
        // only relabel its lines.
        if config.expander.is_some() {
            for n in 0..EXPANDER_LINES {
                let id = ChannelId(EXPANDER_BASE_ID + n);
                if !config.channels.iter().any(|c| c.id == id) {
                    config.channels.push(Channel::new(id.get(), ""));
                }
            }
        }

        if config.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        Ok(config)
    }

    /// Look up the label of a channel.
    pub fn label_of(&self, id: ChannelId) -> Option<&str> {
        self.channels
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.label.as_str())
    }

    /// Width of the longest channel label.
    pub fn max_label_len(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.label.chars().count())
            .max()
            .unwrap_or(0)
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn parse_address(value: &str) -> Option<u16> {
    let lower = value.to_ascii_lowercase();
    match lower.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => lower.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_channels_given() {
        let cfg = ScopeConfig::parse("17:Door\n27:Window\n").unwrap();
        assert_eq!(cfg.polling_interval, Duration::from_millis(100));
        assert_eq!(cfg.history_length, 50);
        assert_eq!(cfg.db_path, PathBuf::from("."));
        assert_eq!(cfg.scale, 2);
        assert_eq!(cfg.axes, TrajectoryAxes::default());
        assert!(cfg.expander.is_none());
        assert_eq!(cfg.channels.len(), 2);
        assert_eq!(cfg.channels[0], Channel::new(17, "Door"));
        assert_eq!(cfg.channels[1], Channel::new(27, "Window"));
    }

    #[test]
    fn parses_settings_and_directions() {
        let text = "\
polling_speed:0.25
history_length:80
db_path:/var/log/gpio
scale:3
north:17
south:27
east:22
west:23
17:Up
";
        let cfg = ScopeConfig::parse(text).unwrap();
        assert_eq!(cfg.polling_interval, Duration::from_millis(250));
        assert_eq!(cfg.history_length, 80);
        assert_eq!(cfg.db_path, PathBuf::from("/var/log/gpio"));
        assert_eq!(cfg.scale, 3);
        assert_eq!(cfg.axes.north, Some(ChannelId(17)));
        assert_eq!(cfg.axes.south, Some(ChannelId(27)));
        assert_eq!(cfg.axes.east, Some(ChannelId(22)));
        assert_eq!(cfg.axes.west, Some(ChannelId(23)));
    }

    #[test]
    fn label_keeps_text_after_first_colon() {
        let cfg = ScopeConfig::parse("5:Sensor: left").unwrap();
        assert_eq!(cfg.channels[0].label, "Sensor: left");
    }

    #[test]
    fn comments_blank_and_colonless_lines_are_skipped() {
        let cfg = ScopeConfig::parse("# comment\n\nnot a setting\n4:Pump\n").unwrap();
        assert_eq!(cfg.channels, vec![Channel::new(4, "Pump")]);
    }

    #[test]
    fn duplicate_channel_keeps_first_position_and_last_label() {
        let cfg = ScopeConfig::parse("4:A\n5:B\n4:C\n").unwrap();
        assert_eq!(cfg.channels, vec![Channel::new(4, "C"), Channel::new(5, "B")]);
    }

    #[test]
    fn tiny_polling_speed_clamps_to_floor() {
        let cfg = ScopeConfig::parse("polling_speed:0.001\n4:A").unwrap();
        assert_eq!(cfg.polling_interval, MIN_POLLING_INTERVAL);
    }

    #[test]
    fn huge_polling_speed_is_an_error() {
        assert!(matches!(
            ScopeConfig::parse("polling_speed:1e30\n17:Door\n"),
            Err(ConfigError::InvalidValue { line: 1, .. })
        ));
    }

    #[test]
    fn scale_is_bounded() {
        let cfg = ScopeConfig::parse("scale:-32767\n4:A").unwrap();
        assert_eq!(cfg.scale, -MAX_SCALE);
        assert!(matches!(
            ScopeConfig::parse("4:A\nscale:2147483647"),
            Err(ConfigError::InvalidValue { line: 2, .. })
        ));
        assert!(matches!(
            ScopeConfig::parse("scale:-2147483648\n4:A"),
            Err(ConfigError::InvalidValue { line: 1, .. })
        ));
        assert!(matches!(
            ScopeConfig::parse("scale:-40000\n4:A"),
            Err(ConfigError::InvalidValue { line: 1, .. })
        ));
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(matches!(
            ScopeConfig::parse("polling_speed:fast\n4:A"),
            Err(ConfigError::InvalidValue { line: 1, .. })
        ));
        assert!(matches!(
            ScopeConfig::parse("4:A\nhistory_length:0"),
            Err(ConfigError::InvalidValue { line: 2, .. })
        ));
        assert!(matches!(
            ScopeConfig::parse("4:A\nnorth:up"),
            Err(ConfigError::InvalidValue { line: 2, .. })
        ));
        assert!(matches!(
            ScopeConfig::parse("color:red\n4:A"),
            Err(ConfigError::UnknownKey { line: 1, .. })
        ));
    }

    #[test]
    fn no_channels_is_an_error() {
        assert!(matches!(
            ScopeConfig::parse("polling_speed:0.1"),
            Err(ConfigError::NoChannels)
        ));
    }

    #[test]
    fn expander_requires_address_and_defaults_bus() {
        assert!(matches!(
            ScopeConfig::parse("mcp_enable:on\n4:A"),
            Err(ConfigError::MissingExpanderAddress)
        ));
        let cfg = ScopeConfig::parse("mcp_enable:true\nmcp_address:0x20\n4:A").unwrap();
        assert_eq!(cfg.expander, Some(ExpanderConfig { address: 0x20, bus: 1 }));
        let cfg = ScopeConfig::parse("mcp_enable:1\nmcp_address:33\nmcp_bus:0").unwrap();
        assert_eq!(cfg.expander, Some(ExpanderConfig { address: 33, bus: 0 }));
    }

    #[test]
    fn enabled_expander_adds_sixteen_channels_with_overrides() {
        let cfg = ScopeConfig::parse("mcp_enable:on\nmcp_address:0x20\n4:A\n103:Limit").unwrap();
        assert_eq!(cfg.channels.len(), 17);
        assert_eq!(cfg.channels[0].label, "A");
        assert_eq!(cfg.label_of(ChannelId(103)), Some("Limit"));
        assert_eq!(cfg.label_of(ChannelId(100)), Some("MCP GPA0"));
        assert_eq!(cfg.label_of(ChannelId(115)), Some("MCP GPB7"));
    }

    #[test]
    fn expander_ids_need_the_expander() {
        assert!(matches!(
            ScopeConfig::parse("4:A\n101:B"),
            Err(ConfigError::ExpanderChannelWithoutExpander { line: 2, id: 101 })
        ));
        assert!(matches!(
            ScopeConfig::parse("200:B"),
            Err(ConfigError::ChannelOutOfRange { line: 1, id: 200 })
        ));
    }

    #[test]
    fn max_label_len_counts_chars() {
        let cfg = ScopeConfig::parse("1:ab\n2:abcdé").unwrap();
        assert_eq!(cfg.max_label_len(), 5);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ScopeConfig::load(Path::new("/nonexistent/gpioscope/config.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
