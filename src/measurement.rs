//! Per-sweep statistics: extrema, mean, frequency, and signal presence.
//!
//! Everything here is a pure single pass over one immutable buffer
//! snapshot; nothing is persisted between sweeps. The extrema are tracked
//! on a 5-tap mean-filtered copy of the stream so a single-sample spike
//! does not inflate Vpp, while the mean statistic is computed over the raw
//! samples. That dual treatment changes numeric output and is part of the
//! wire contract; keep it.

use crate::calibration::CalibrationCurve;
use crate::filters::{MeanFilter, ScalarFilter};
use crate::limits::{EXTREMA_FILTER_TAPS, NOISE_FLOOR_VPP};

/// Extrema and mean of one sweep, in code units.
///
/// `max` and `min` are fractional because they come from the filtered
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BufferStats {
    /// Largest filtered value seen in the sweep.
    pub max: f64,
    /// Smallest filtered value seen in the sweep.
    pub min: f64,
    /// Arithmetic mean of the raw samples.
    pub mean: f64,
}

/// Fundamental frequency estimate for one sweep.
///
/// Both fields are zero when the sweep does not contain enough crossings to
/// establish a period.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrequencyEstimate {
    /// Estimated fundamental frequency in Hz.
    pub frequency: f64,
    /// Reciprocal of `frequency`, in seconds.
    pub period: f64,
}

/// Everything one DATA emission carries besides the samples themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementSnapshot {
    /// Code-unit statistics of the sweep.
    pub stats: BufferStats,
    /// Zero-crossing frequency estimate.
    pub freq: FrequencyEstimate,
    /// Peak-to-peak voltage, scaled by the probe attenuation.
    pub vpp: f64,
    /// Mean voltage, scaled by the probe attenuation.
    pub vmean: f64,
}

/// Single pass over the sweep producing filtered extrema and the raw mean.
///
/// The extrema filter is primed with the first raw sample, so a constant
/// buffer reports `max == min == mean == c`.
pub fn peak_mean_analysis(samples: &[u16]) -> BufferStats {
    let Some(&first) = samples.first() else {
        return BufferStats::default();
    };

    let first = f64::from(first);
    let mut filter = MeanFilter::new(EXTREMA_FILTER_TAPS);
    filter.init(first);

    let mut max = first;
    let mut min = first;
    let mut sum = 0.0;
    for &sample in samples {
        let raw = f64::from(sample);
        let smoothed = filter.filter(raw);
        if smoothed > max {
            max = smoothed;
        }
        if smoothed < min {
            min = smoothed;
        }
        sum += raw;
    }

    BufferStats {
        max,
        min,
        mean: sum / samples.len() as f64,
    }
}

/// Zero-crossing frequency estimate over one sweep.
///
/// Counts transitions from below `mean` to at-or-above it. A sweep with one
/// crossing or none cannot establish a period and reports zero rather than
/// extrapolating.
pub fn estimate_frequency(samples: &[u16], sample_rate: u32, mean: f64) -> FrequencyEstimate {
    let rising = samples
        .windows(2)
        .filter(|pair| f64::from(pair[0]) < mean && f64::from(pair[1]) >= mean)
        .count();

    if rising > 1 && sample_rate > 0 {
        let total_time = samples.len() as f64 / f64::from(sample_rate);
        let frequency = rising as f64 / total_time;
        FrequencyEstimate {
            frequency,
            period: 1.0 / frequency,
        }
    } else {
        FrequencyEstimate::default()
    }
}

/// Whether the sweep carries more than the 50 mV peak-to-peak noise floor.
///
/// Diagnostic only; emission is never gated on this.
pub fn signal_present(stats: &BufferStats, curve: &CalibrationCurve) -> bool {
    curve.to_voltage(stats.max) - curve.to_voltage(stats.min) > NOISE_FLOOR_VPP
}

/// Bundle the per-sweep measurements one DATA emission needs.
///
/// `probe_scale` is the attenuation factor of the external probe divider;
/// the reported voltages are multiplied by it so the client displays
/// at-the-probe values.
pub fn analyze(
    samples: &[u16],
    sample_rate: u32,
    curve: &CalibrationCurve,
    probe_scale: f64,
) -> MeasurementSnapshot {
    let stats = peak_mean_analysis(samples);
    let freq = estimate_frequency(samples, sample_rate, stats.mean);
    let vpp = (curve.to_voltage(stats.max) - curve.to_voltage(stats.min)) * probe_scale;
    let vmean = curve.to_voltage(stats.mean) * probe_scale;

    MeasurementSnapshot {
        stats,
        freq,
        vpp,
        vmean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationSource;
    use crate::limits::{BUFFER_DEPTH, FULL_SCALE_VOLTS};

    fn default_curve() -> CalibrationCurve {
        CalibrationCurve::characterize(&CalibrationSource::ManufacturerDefault, FULL_SCALE_VOLTS)
            .unwrap()
    }

    /// `half_period` samples low, `half_period` samples high, repeated.
    fn square_wave(len: usize, half_period: usize, low: u16, high: u16) -> Vec<u16> {
        (0..len)
            .map(|i| if (i / half_period) % 2 == 0 { low } else { high })
            .collect()
    }

    #[test]
    fn constant_buffer_collapses_all_stats() {
        let samples = vec![1234u16; BUFFER_DEPTH];
        let stats = peak_mean_analysis(&samples);
        assert_eq!(stats.max, 1234.0);
        assert_eq!(stats.min, 1234.0);
        assert_eq!(stats.mean, 1234.0);
    }

    #[test]
    fn empty_buffer_reports_zero_stats() {
        let stats = peak_mean_analysis(&[]);
        assert_eq!(stats, BufferStats::default());
    }

    #[test]
    fn spike_is_smoothed_out_of_extrema_but_not_mean() {
        let mut samples = vec![1000u16; 101];
        samples[50] = 4000;
        let stats = peak_mean_analysis(&samples);
        // one spike entering a 5-tap window tops out at (4*1000 + 4000) / 5
        assert!((stats.max - 1600.0).abs() < 1e-9);
        assert!((stats.min - 1000.0).abs() < 1e-9);
        let raw_mean = (1000.0 * 100.0 + 4000.0) / 101.0;
        assert!((stats.mean - raw_mean).abs() < 1e-9);
    }

    #[test]
    fn square_wave_frequency_matches_edge_count() {
        let half = 100;
        let samples = square_wave(BUFFER_DEPTH, half, 500, 3500);
        let stats = peak_mean_analysis(&samples);
        let rising = samples
            .windows(2)
            .filter(|p| f64::from(p[0]) < stats.mean && f64::from(p[1]) >= stats.mean)
            .count();
        assert!(rising > 1);

        let rate = 100_000;
        let est = estimate_frequency(&samples, rate, stats.mean);
        let expected = rising as f64 / (samples.len() as f64 / f64::from(rate));
        assert!((est.frequency - expected).abs() < 1e-9);
        assert!((est.period - 1.0 / expected).abs() < 1e-12);
    }

    #[test]
    fn single_crossing_reports_zero() {
        // low half then high half: exactly one rising crossing of the mean
        let mut samples = vec![500u16; 100];
        samples.extend(std::iter::repeat(3500u16).take(100));
        let mean = 2000.0;
        let est = estimate_frequency(&samples, 100_000, mean);
        assert_eq!(est.frequency, 0.0);
        assert_eq!(est.period, 0.0);
    }

    #[test]
    fn dc_buffer_reports_zero_frequency() {
        let samples = vec![1800u16; BUFFER_DEPTH];
        let est = estimate_frequency(&samples, 500_000, 1800.0);
        assert_eq!(est.frequency, 0.0);
    }

    #[test]
    fn signal_present_uses_the_noise_floor() {
        let curve = default_curve();
        // 62 codes span just under 50 mV, 63 codes just over
        let quiet = BufferStats {
            max: 2110.0,
            min: 2048.0,
            mean: 2079.0,
        };
        assert!(!signal_present(&quiet, &curve));
        let live = BufferStats {
            max: 2111.0,
            min: 2048.0,
            mean: 2079.0,
        };
        assert!(signal_present(&live, &curve));
    }

    #[test]
    fn analyze_scales_voltages_by_probe() {
        let curve = default_curve();
        let samples = square_wave(1000, 50, 1000, 3000);
        let x1 = analyze(&samples, 100_000, &curve, 1.0);
        let x10 = analyze(&samples, 100_000, &curve, 10.0);
        assert!((x10.vpp - x1.vpp * 10.0).abs() < 1e-9);
        assert!((x10.vmean - x1.vmean * 10.0).abs() < 1e-9);
        assert_eq!(x1.stats, x10.stats);
        assert_eq!(x1.freq, x10.freq);
    }
}
