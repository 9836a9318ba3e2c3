//! Simulator Configuration
//!
//! YAML configuration for the load generator. Every field has a default so a
//! minimal file (or none at all) yields a runnable setup against a local peer.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gtpsim_gtp::v2::types::{parse_digits, MAX_IMSI_DIGITS};
use gtpsim_gtp::GTPV2_C_UDP_PORT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

// ============================================================================
// Interface
// ============================================================================

/// Reference point the simulator speaks on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Interface {
    #[default]
    S11,
    S4,
    S5,
    S8,
}

impl Interface {
    /// S11 and S4 carry all PDNs of a UE over one control tunnel
    pub fn shares_control_tunnel(&self) -> bool {
        matches!(self, Self::S11 | Self::S4)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::S11 => "S11",
            Self::S4 => "S4",
            Self::S5 => "S5",
            Self::S8 => "S8",
        }
    }
}

// ============================================================================
// Simulator Configuration
// ============================================================================

fn default_local_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], GTPV2_C_UDP_PORT))
}

fn default_remote_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], GTPV2_C_UDP_PORT))
}

fn default_t3_ms() -> u64 {
    3000
}

fn default_n3() -> u32 {
    3
}

fn default_dead_call_ms() -> u64 {
    10_000
}

fn default_rate() -> f64 {
    10.0
}

fn default_imsi_start() -> String {
    "001010000000001".to_string()
}

fn default_poll_batch() -> usize {
    64
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_stats_interval_ms() -> u64 {
    5000
}

/// Simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Local GTP-C endpoint
    #[serde(default = "default_local_addr")]
    pub local_addr: SocketAddr,
    /// Peer GTP-C endpoint that client sessions talk to
    #[serde(default = "default_remote_addr")]
    pub remote_addr: SocketAddr,
    #[serde(default)]
    pub interface: Interface,
    /// Scenario file path
    #[serde(default)]
    pub scenario: Option<PathBuf>,
    /// Retransmission timer (T3) in milliseconds
    #[serde(default = "default_t3_ms")]
    pub t3_ms: u64,
    /// Maximum number of retransmissions (N3)
    #[serde(default = "default_n3")]
    pub n3: u32,
    /// Grace period a finished session lingers to answer late retransmissions
    #[serde(default = "default_dead_call_ms")]
    pub dead_call_ms: u64,
    /// New client sessions per second
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// Total sessions to generate (0 = unlimited)
    #[serde(default)]
    pub max_sessions: u64,
    /// Simultaneously active sessions (0 = unlimited)
    #[serde(default)]
    pub max_concurrent: usize,
    /// IMSI of the first generated session
    #[serde(default = "default_imsi_start")]
    pub imsi_start: String,
    /// Restart counter advertised in Echo Response
    #[serde(default)]
    pub recovery: u8,
    /// Maximum datagrams read per loop iteration
    #[serde(default = "default_poll_batch")]
    pub poll_batch: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_stats_interval_ms")]
    pub stats_interval_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            local_addr: default_local_addr(),
            remote_addr: default_remote_addr(),
            interface: Interface::default(),
            scenario: None,
            t3_ms: default_t3_ms(),
            n3: default_n3(),
            dead_call_ms: default_dead_call_ms(),
            rate: default_rate(),
            max_sessions: 0,
            max_concurrent: 0,
            imsi_start: default_imsi_start(),
            recovery: 0,
            poll_batch: default_poll_batch(),
            poll_interval_ms: default_poll_interval_ms(),
            stats_interval_ms: default_stats_interval_ms(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.t3_ms == 0 && self.n3 == 0 {
            return Err(ConfigError::ValidationError(
                "t3_ms and n3 cannot both be zero".to_string(),
            ));
        }
        if self.t3_ms == 0 {
            return Err(ConfigError::ValidationError(
                "t3_ms must be greater than zero".to_string(),
            ));
        }
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "rate {} must be a positive number",
                self.rate
            )));
        }
        if self.poll_batch == 0 {
            return Err(ConfigError::ValidationError(
                "poll_batch must be greater than zero".to_string(),
            ));
        }
        if self.stats_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "stats_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.imsi_start_value()?;
        Ok(())
    }

    /// Numeric value of `imsi_start`
    pub fn imsi_start_value(&self) -> Result<u64, ConfigError> {
        let digits = parse_digits("imsi_start", &self.imsi_start)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        if digits.len() < 6 || digits.len() > MAX_IMSI_DIGITS {
            return Err(ConfigError::ValidationError(format!(
                "imsi_start '{}' must have 6 to {MAX_IMSI_DIGITS} digits",
                self.imsi_start
            )));
        }
        self.imsi_start
            .parse::<u64>()
            .map_err(|e| ConfigError::ValidationError(format!("imsi_start: {e}")))
    }

    pub fn t3(&self) -> Duration {
        Duration::from_millis(self.t3_ms)
    }

    pub fn dead_call(&self) -> Duration {
        Duration::from_millis(self.dead_call_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.t3(), Duration::from_secs(3));
        assert_eq!(config.n3, 3);
        assert_eq!(config.remote_addr.port(), GTPV2_C_UDP_PORT);
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        assert_eq!(SimConfig::from_yaml("").unwrap(), SimConfig::default());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
remote_addr: 10.0.0.2:2123
interface: S5
t3_ms: 500
n3: 5
max_sessions: 100
imsi_start: "001010123456789"
"#;
        let config = SimConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.remote_addr, "10.0.0.2:2123".parse().unwrap());
        assert_eq!(config.interface, Interface::S5);
        assert!(!config.interface.shares_control_tunnel());
        assert_eq!(config.t3_ms, 500);
        assert_eq!(config.n3, 5);
        assert_eq!(config.max_sessions, 100);
        assert_eq!(config.dead_call_ms, 10_000);
        assert_eq!(config.imsi_start_value().unwrap(), 1_010_123_456_789);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            SimConfig::from_yaml("t3_ms: [1, 2]"),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            SimConfig::from_yaml("interface: S1"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let config = SimConfig { t3_ms: 0, n3: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let config = SimConfig { poll_batch: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = SimConfig { rate: 0.0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = SimConfig { imsi_start: "00101abc".to_string(), ..Default::default() };
        assert!(config.validate().is_err());

        let config = SimConfig { imsi_start: "1234567890123456".to_string(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interface_tunnel_sharing() {
        assert!(Interface::S11.shares_control_tunnel());
        assert!(Interface::S4.shares_control_tunnel());
        assert!(!Interface::S8.shares_control_tunnel());
        assert_eq!(Interface::S4.name(), "S4");
    }

    #[test]
    fn test_bundled_config() {
        let config = SimConfig::from_yaml(include_str!("../../../../configs/gtpsim.yaml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.interface, Interface::S11);
        assert_eq!(config.max_sessions, 1000);
        assert_eq!(config.scenario, Some(PathBuf::from("scenarios/attach_detach.yaml")));
    }
}
