//! Relay configuration: command line / environment, with validation.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use hunter_common::ConfigError;

use crate::dispatcher::COUNTDOWN;
use crate::room::{RoomConfig, INITIAL_LEVEL};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Parser)]
#[command(name = "hunter-relay", about = "WebSocket room relay for two-player Pixel Hunter matches")]
pub struct Args {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// A player whose level exceeds this wins the match.
    #[arg(long, default_value_t = 15)]
    pub target_level: u32,

    /// Starting difficulty stored with each room (not sent to clients).
    #[arg(long, default_value_t = 16.0)]
    pub diff_start: f64,

    /// Difficulty floor stored with each room (not sent to clients).
    #[arg(long, default_value_t = 1.2)]
    pub diff_min: f64,

    /// Delay between `countdown_start` and `game_start`, in milliseconds.
    #[arg(long, default_value_t = 3200)]
    pub countdown_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub room: RoomConfig,
    pub countdown: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            room: RoomConfig::default(),
            countdown: COUNTDOWN,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room.target_level < INITIAL_LEVEL {
            return Err(ConfigError::ValidationError(format!(
                "target level must be at least {INITIAL_LEVEL}, got {}",
                self.room.target_level
            )));
        }
        if self.countdown.is_zero() {
            return Err(ConfigError::ValidationError(
                "countdown must be longer than zero".into(),
            ));
        }
        for (name, value) in [
            ("diff_start", self.room.diff_start),
            ("diff_min", self.room.diff_min),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<Args> for RelayConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let ip: IpAddr = args
            .host
            .parse()
            .map_err(|e| ConfigError::ParseError(format!("invalid host '{}': {e}", args.host)))?;
        let config = Self {
            bind_addr: SocketAddr::new(ip, args.port),
            room: RoomConfig {
                target_level: args.target_level,
                diff_start: args.diff_start,
                diff_min: args.diff_min,
            },
            countdown: Duration::from_millis(args.countdown_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["hunter-relay"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn explicit_flags_build_config() {
        let args = parse(&[
            "--port",
            "4100",
            "--host",
            "127.0.0.1",
            "--target-level",
            "8",
            "--countdown-ms",
            "500",
        ]);
        let config = RelayConfig::try_from(args).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:4100".parse::<SocketAddr>().unwrap());
        assert_eq!(config.room.target_level, 8);
        assert_eq!(config.countdown, Duration::from_millis(500));
    }

    #[test]
    fn defaults_match_default_config() {
        let args = Args::try_parse_from([
            "hunter-relay",
            "--port",
            "3000",
            "--host",
            "0.0.0.0",
        ])
        .unwrap();
        assert_eq!(RelayConfig::try_from(args).unwrap(), RelayConfig::default());
    }

    #[test]
    fn default_config_is_valid() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.countdown, Duration::from_millis(3200));
        assert_eq!(config.room.target_level, 15);
    }

    #[test]
    fn rejects_bad_host() {
        let args = parse(&["--host", "not-an-ip"]);
        let err = RelayConfig::try_from(args).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn rejects_low_target_level() {
        let args = parse(&["--target-level", "1"]);
        let err = RelayConfig::try_from(args).unwrap_err();
        assert!(err.to_string().contains("target level"));
    }

    #[test]
    fn rejects_zero_countdown() {
        let config = RelayConfig {
            countdown: Duration::ZERO,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_difficulty() {
        let mut config = RelayConfig::default();
        config.room.diff_min = 0.0;
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.room.diff_start = f64::NAN;
        assert!(config.validate().is_err());
    }
}
