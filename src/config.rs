//! Configuration system using Figment.
//!
//! This module provides strongly-typed configuration loading.
//! Configuration is loaded from:
//! 1. A TOML file (base configuration, `config/scope.toml` by default)
//! 2. Environment variables (prefixed with `RUST_SCOPE_`)
//!
//! Every field has a default, so a missing file yields a fully working
//! configuration for the simulated instrument.
//!
//! # Example
//! ```no_run
//! use rust_scope::config::ScopeConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ScopeConfig::load()?;
//! config.validate()?;
//! println!("serving on {}", config.server.bind);
//! # Ok(())
//! # }
//! ```

use crate::calibration::{CalPoint, CalibrationSource};
use crate::controller::{AcquisitionConfig, ProbeAttenuation};
use crate::error::{ScopeError, ScopeResult};
use crate::hardware::{SimTiming, SimulatedAdc, Waveform};
use crate::limits::DEFAULT_SAMPLE_RATE_HZ;
use crate::trigger::{TriggerEdge, TriggerMode};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Application settings.
    pub application: ApplicationConfig,
    /// Converter characteristics and calibration reference.
    pub adc: AdcConfig,
    /// Startup acquisition settings.
    pub acquisition: AcquisitionDefaults,
    /// Simulated signal source settings.
    pub simulator: SimulatorConfig,
    /// Daemon transport settings.
    pub server: ServerConfig,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Logging output format (pretty, compact, json).
    pub log_format: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

/// Converter characteristics and the calibration reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdcConfig {
    /// Nominal full-scale input voltage.
    pub full_scale_volts: f64,
    /// Measured reference points. Empty means the manufacturer-default
    /// two-point curve.
    pub calibration: Vec<CalPoint>,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            full_scale_volts: crate::limits::FULL_SCALE_VOLTS,
            calibration: Vec::new(),
        }
    }
}

/// Acquisition settings applied at startup. The client mutates them over
/// the wire afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionDefaults {
    /// Startup sample rate in Hz.
    pub sample_rate: u32,
    /// Startup emission policy.
    pub trigger_mode: TriggerMode,
    /// Startup trigger level in volts.
    pub trigger_level: f64,
    /// Startup crossing direction.
    pub trigger_edge: TriggerEdge,
    /// Startup probe compensation.
    pub probe: ProbeAttenuation,
}

impl Default for AcquisitionDefaults {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
            trigger_mode: TriggerMode::default(),
            trigger_level: 1.65,
            trigger_edge: TriggerEdge::default(),
            probe: ProbeAttenuation::default(),
        }
    }
}

/// Simulated signal source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Signal shape.
    pub waveform: Waveform,
    /// Signal frequency in Hz.
    pub frequency: f64,
    /// Signal amplitude in volts.
    pub amplitude: f64,
    /// DC offset in volts.
    pub offset: f64,
    /// Additive noise standard deviation in volts.
    pub noise: f64,
    /// Pulse duty cycle as a fraction in [0, 1].
    pub duty: f64,
    /// Round pacing. The daemon defaults to realtime so frames arrive at
    /// the sweep rate like hardware.
    pub timing: SimTiming,
    /// Noise generator seed; omit for entropy-seeded noise.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: 1000.0,
            amplitude: 2.0,
            offset: 1.65,
            noise: 0.05,
            duty: 0.5,
            timing: SimTiming::Realtime,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Assemble a simulated source from these settings.
    pub fn build(&self) -> SimulatedAdc {
        let adc = SimulatedAdc::new(self.waveform)
            .frequency(self.frequency)
            .amplitude(self.amplitude)
            .offset(self.offset)
            .noise(self.noise)
            .duty(self.duty)
            .timing(self.timing);
        match self.seed {
            Some(seed) => adc.seed(seed),
            None => adc,
        }
    }
}

/// Daemon transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP listen address for the daemon.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: format!("127.0.0.1:{}", crate::limits::DEFAULT_TCP_PORT),
        }
    }
}

impl ScopeConfig {
    /// Load configuration from `config/scope.toml` and the environment.
    ///
    /// Environment variables override file values with prefix `RUST_SCOPE_`
    /// and `__` as the section separator.
    /// Example: `RUST_SCOPE_APPLICATION__LOG_LEVEL=debug`.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/scope.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("RUST_SCOPE_").split("__"))
            .extract()
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> ScopeResult<()> {
        crate::logging::LogSettings::from_config(&self.application)?;

        if !self.adc.full_scale_volts.is_finite() || self.adc.full_scale_volts <= 0.0 {
            return Err(ScopeError::Configuration(format!(
                "full_scale_volts must be positive, got {}",
                self.adc.full_scale_volts
            )));
        }

        for (field, value) in [
            ("simulator.frequency", self.simulator.frequency),
            ("simulator.amplitude", self.simulator.amplitude),
            ("simulator.noise", self.simulator.noise),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScopeError::Configuration(format!(
                    "{field} must be non-negative, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.simulator.duty) {
            return Err(ScopeError::Configuration(format!(
                "simulator.duty must be within [0, 1], got {}",
                self.simulator.duty
            )));
        }

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(ScopeError::Configuration(format!(
                "server.bind '{}' is not a valid socket address",
                self.server.bind
            )));
        }

        Ok(())
    }

    /// The calibration reference these settings describe.
    pub fn calibration_source(&self) -> CalibrationSource {
        if self.adc.calibration.is_empty() {
            CalibrationSource::ManufacturerDefault
        } else {
            CalibrationSource::MeasuredReference(self.adc.calibration.clone())
        }
    }

    /// Startup acquisition configuration (always stopped until `START`).
    pub fn acquisition_defaults(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            running: false,
            sample_rate: self.acquisition.sample_rate,
            trigger_mode: self.acquisition.trigger_mode,
            trigger_level: self.acquisition.trigger_level,
            trigger_edge: self.acquisition.trigger_edge,
            probe: self.acquisition.probe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_validate_cleanly() {
        let config = ScopeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.acquisition.sample_rate, DEFAULT_SAMPLE_RATE_HZ);
        assert_eq!(config.server.bind, "127.0.0.1:9999");
        assert!(matches!(
            config.calibration_source(),
            CalibrationSource::ManufacturerDefault
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ScopeConfig::load_from("does/not/exist.toml").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulator.frequency, 1000.0);
    }

    #[test]
    fn partial_file_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[acquisition]
sample_rate = 200000
trigger_mode = "normal"

[simulator]
waveform = "square"
frequency = 2500.0
seed = 42

[[adc.calibration]]
code = 0
volts = 0.0

[[adc.calibration]]
code = 4095
volts = 3.28
"#
        )
        .unwrap();

        let config = ScopeConfig::load_from(file.path()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.acquisition.sample_rate, 200_000);
        assert_eq!(config.acquisition.trigger_mode, TriggerMode::Normal);
        assert_eq!(config.simulator.waveform, Waveform::Square);
        assert_eq!(config.simulator.seed, Some(42));
        // untouched sections keep their defaults
        assert_eq!(config.application.log_level, "info");
        assert!(matches!(
            config.calibration_source(),
            CalibrationSource::MeasuredReference(ref points) if points.len() == 2
        ));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = ScopeConfig::default();
        config.application.log_level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = ScopeConfig::default();
        config.simulator.duty = 1.5;
        assert!(config.validate().is_err());

        let mut config = ScopeConfig::default();
        config.server.bind = "not-an-address".into();
        assert!(config.validate().is_err());

        let mut config = ScopeConfig::default();
        config.adc.full_scale_volts = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn acquisition_defaults_start_stopped() {
        let config = ScopeConfig::default();
        let defaults = config.acquisition_defaults();
        assert!(!defaults.running);
        assert_eq!(defaults.trigger_level, 1.65);
    }
}
