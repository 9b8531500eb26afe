//! Simulated ADC sample source.
//!
//! Generates the classic test waveforms so the daemon and the test suite can
//! run without a converter attached. All delays use async-safe operations
//! (`tokio::time::sleep`, never `std::thread::sleep`).
//!
//! # Determinism
//!
//! Noise comes from a ChaCha8 generator. Construct with
//! [`SimulatedAdc::seed`] to make every generated sweep reproducible;
//! unseeded sources draw their state from the system entropy pool.
//!
//! # Fault injection
//!
//! [`SimulatedAdc::inject_fill_timeouts`] arms a number of upcoming
//! acquisition rounds to fail with a timeout, which is how the test suite
//! exercises the controller's discard-and-restart path.

use crate::error::{ScopeError, ScopeResult};
use crate::limits::{FULL_SCALE_VOLTS, MAX_CODE, ROUND_TIMEOUT};
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use tokio::time::sleep;
use tracing::{debug, trace};

use super::SampleSource;

/// Test signal shapes, matching the bench generator the visualization
/// client was developed against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    /// `A * sin(2*pi*f*t)`.
    #[default]
    Sine,
    /// `A * sign(sin(2*pi*f*t))`.
    Square,
    /// Symmetric ramp up and down once per period.
    Triangle,
    /// Linear ramp with an instantaneous flyback once per period.
    Sawtooth,
    /// High for `duty` of each period, low otherwise.
    Pulse,
    /// Gaussian noise with standard deviation `A / 3`.
    Noise,
    /// Flat line at the offset voltage.
    Dc,
}

/// How a simulated acquisition round spends time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimTiming {
    /// Return as soon as the sweep is generated. Used by tests.
    #[default]
    Instant,
    /// Sleep for the sweep duration first, like a real DMA round.
    Realtime,
}

/// Software implementation of [`SampleSource`] producing synthetic sweeps.
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    waveform: Waveform,
    frequency_hz: f64,
    amplitude: f64,
    offset: f64,
    noise_level: f64,
    duty: f64,
    timing: SimTiming,
    rng: ChaCha8Rng,
    sample_rate: Option<u32>,
    elapsed: f64,
    pending_timeouts: u32,
}

impl SimulatedAdc {
    /// Create a source with the bench generator's defaults: 1 kHz signal,
    /// 2.0 V amplitude around a 1.65 V offset, 50 mV noise, 50% duty.
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            frequency_hz: 1000.0,
            amplitude: 2.0,
            offset: 1.65,
            noise_level: 0.05,
            duty: 0.5,
            timing: SimTiming::Instant,
            rng: ChaCha8Rng::from_entropy(),
            sample_rate: None,
            elapsed: 0.0,
            pending_timeouts: 0,
        }
    }

    /// Set the signal frequency in Hz.
    pub fn frequency(mut self, hz: f64) -> Self {
        self.frequency_hz = hz.max(0.0);
        self
    }

    /// Set the signal amplitude in volts.
    pub fn amplitude(mut self, volts: f64) -> Self {
        self.amplitude = volts.max(0.0);
        self
    }

    /// Set the DC offset in volts.
    pub fn offset(mut self, volts: f64) -> Self {
        self.offset = volts;
        self
    }

    /// Set the additive noise standard deviation in volts.
    pub fn noise(mut self, volts: f64) -> Self {
        self.noise_level = volts.max(0.0);
        self
    }

    /// Set the pulse duty cycle as a fraction in [0, 1].
    pub fn duty(mut self, fraction: f64) -> Self {
        self.duty = fraction.clamp(0.0, 1.0);
        self
    }

    /// Select instant or realtime round pacing.
    pub fn timing(mut self, timing: SimTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Seed the noise generator for reproducible sweeps.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Arm the next `rounds` calls to `fill` to fail with a timeout.
    pub fn inject_fill_timeouts(&mut self, rounds: u32) {
        self.pending_timeouts = rounds;
    }

    /// Ideal (noise-free, unclipped) signal voltage at time `t` seconds.
    fn voltage_at(&self, t: f64) -> f64 {
        let a = self.amplitude;
        let f = self.frequency_hz;
        let cycles = t * f;
        let shape = match self.waveform {
            Waveform::Sine => a * (TAU * cycles).sin(),
            Waveform::Square => a * (TAU * cycles).sin().signum(),
            Waveform::Triangle => a * 2.0 * (2.0 * (cycles - (cycles + 0.5).floor())).abs() - a,
            Waveform::Sawtooth => a * 2.0 * (cycles - (cycles + 0.5).floor()),
            Waveform::Pulse => {
                if cycles.rem_euclid(1.0) < self.duty {
                    a
                } else {
                    0.0
                }
            }
            // noise is drawn in fill(), where the RNG is reachable mutably
            Waveform::Noise | Waveform::Dc => 0.0,
        };
        shape + self.offset
    }

    /// Approximate draw from N(0, sigma) by summing twelve uniforms.
    fn gaussian(&mut self, sigma: f64) -> f64 {
        if sigma <= 0.0 {
            return 0.0;
        }
        let sum: f64 = (0..12).map(|_| self.rng.gen::<f64>()).sum();
        (sum - 6.0) * sigma
    }
}

impl Default for SimulatedAdc {
    fn default() -> Self {
        Self::new(Waveform::Sine)
    }
}

#[async_trait]
impl SampleSource for SimulatedAdc {
    async fn configure(&mut self, sample_rate: u32) -> ScopeResult<()> {
        if sample_rate == 0 {
            return Err(ScopeError::Configuration(
                "sample rate must be non-zero".into(),
            ));
        }
        self.sample_rate = Some(sample_rate);
        debug!(sample_rate, "simulated ADC reconfigured");
        Ok(())
    }

    async fn fill(&mut self, buffer: &mut [u16]) -> ScopeResult<()> {
        let rate = self.sample_rate.ok_or(ScopeError::SourceNotConfigured)?;

        if self.pending_timeouts > 0 {
            self.pending_timeouts -= 1;
            debug!(remaining = self.pending_timeouts, "injected round timeout");
            return Err(ScopeError::AcquisitionTimeout(ROUND_TIMEOUT));
        }

        let dt = 1.0 / f64::from(rate);
        let sweep = buffer.len() as f64 * dt;
        if self.timing == SimTiming::Realtime {
            sleep(std::time::Duration::from_secs_f64(sweep)).await;
        }

        let noise_sigma = match self.waveform {
            Waveform::Noise => self.amplitude / 3.0,
            _ => 0.0,
        };
        for (i, slot) in buffer.iter_mut().enumerate() {
            let t = self.elapsed + i as f64 * dt;
            let mut volts = self.voltage_at(t);
            if noise_sigma > 0.0 {
                volts += self.gaussian(noise_sigma);
            }
            volts += self.gaussian(self.noise_level);
            let volts = volts.clamp(0.0, FULL_SCALE_VOLTS);
            *slot = (volts / FULL_SCALE_VOLTS * f64::from(MAX_CODE)).round() as u16;
        }
        self.elapsed += sweep;
        trace!(samples = buffer.len(), rate, "simulated sweep generated");
        Ok(())
    }
}
