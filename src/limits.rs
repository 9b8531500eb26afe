//! Shared numeric limits and canonical link parameters.
//!
//! This module centralizes:
//! - ADC code range and buffer sizing
//! - Sample-rate bounds and the clamping helper
//! - Controller poll intervals
//! - Measurement constants (noise floor, extrema filter width)
//! - Canonical transport parameters expected by the visualization client
//!
//! Using centralized constants keeps the controller, protocol handler, and
//! tests agreed on the same figures and makes tuning easier.

use std::time::Duration;

// =============================================================================
// ADC Geometry
// =============================================================================

/// Highest legal 12-bit ADC code.
pub const MAX_CODE: u16 = 4095;

/// Mask applied to every sample entering the buffer.
pub const CODE_MASK: u16 = 0x0FFF;

/// ADC full-scale input voltage.
pub const FULL_SCALE_VOLTS: f64 = 3.3;

/// Samples per acquisition sweep.
pub const BUFFER_DEPTH: usize = 2000;

// =============================================================================
// Sample Rate
// =============================================================================

/// Slowest supported sampling rate (Hz).
pub const MIN_SAMPLE_RATE_HZ: u32 = 10_000;

/// Fastest supported sampling rate (Hz).
pub const MAX_SAMPLE_RATE_HZ: u32 = 1_000_000;

/// Startup sampling rate (Hz).
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100_000;

/// Clamp a requested rate into the supported range.
///
/// Out-of-range requests are adjusted, never rejected; the applied value is
/// observable through the `STATUS` response.
pub fn clamp_sample_rate(requested: u32) -> u32 {
    requested.clamp(MIN_SAMPLE_RATE_HZ, MAX_SAMPLE_RATE_HZ)
}

// =============================================================================
// Controller Timing
// =============================================================================

/// Command-poll window between acquisition cycles while running.
///
/// Short enough that a command queued during a sweep is applied before the
/// next round reads the configuration.
pub const RUN_POLL: Duration = Duration::from_millis(1);

/// Command-poll window while stopped.
///
/// No sampling occurs in the stopped state, so the loop idles longer per
/// poll.
pub const IDLE_POLL: Duration = Duration::from_millis(50);

/// Upper bound on one acquisition round.
///
/// The slowest legal sweep (2000 samples at 10 kHz) completes in 200 ms;
/// a round exceeding this bound is reported as a timeout fault.
pub const ROUND_TIMEOUT: Duration = Duration::from_millis(1500);

// =============================================================================
// Measurement Constants
// =============================================================================

/// Peak-to-peak noise floor in volts for the `signal_present` check.
pub const NOISE_FLOOR_VPP: f64 = 0.05;

/// Window length of the mean filter applied to extrema tracking.
pub const EXTREMA_FILTER_TAPS: usize = 5;

/// Longest supported mean-filter window.
pub const MAX_FILTER_WINDOW: usize = 100;

// =============================================================================
// Canonical Link Parameters
// =============================================================================

/// Serial baud rate the visualization client connects at.
pub const LINK_BAUD: u32 = 921_600;

/// Default TCP port for the simulated-instrument daemon.
pub const DEFAULT_TCP_PORT: u16 = 9999;
