//! ADC characterization and code/voltage conversion.
//!
//! The calibration curve is built exactly once at startup from a reference
//! source and is immutable afterwards. Conversion methods only exist on the
//! constructed curve, so "convert before characterize" cannot be expressed.
//!
//! The two directions are intentionally asymmetric:
//!
//! - [`CalibrationCurve::to_voltage`] follows the (possibly non-linear)
//!   characterization, interpolating piecewise-linearly between reference
//!   points. It accepts fractional codes because filtered extrema are
//!   fractional.
//! - [`CalibrationCurve::from_voltage`] is a fixed linear scale over the
//!   nominal full-scale voltage, rounded and clamped. It is an approximation
//!   used for threshold comparisons (trigger levels), not for high-accuracy
//!   reconstruction.

use crate::error::{ScopeError, ScopeResult};
use crate::limits::MAX_CODE;
use serde::{Deserialize, Serialize};

/// One reference point relating an ADC code to the voltage applied at the
/// input pin during characterization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalPoint {
    /// Raw ADC code observed at the reference voltage.
    pub code: u16,
    /// Reference voltage applied at the pin.
    pub volts: f64,
}

/// Reference data the characterization is built from.
#[derive(Debug, Clone)]
pub enum CalibrationSource {
    /// Ideal two-point curve spanning the full scale. Used when no measured
    /// reference is available.
    ManufacturerDefault,
    /// Points measured against an external voltage reference. Must span the
    /// whole code range.
    MeasuredReference(Vec<CalPoint>),
}

/// Immutable Sample-to-Voltage mapping for one ADC channel.
#[derive(Debug, Clone)]
pub struct CalibrationCurve {
    points: Vec<CalPoint>,
    full_scale: f64,
}

impl CalibrationCurve {
    /// Build the curve from a reference source.
    ///
    /// `full_scale` is the nominal input range of the converter and fixes
    /// the linear scale used by [`from_voltage`](Self::from_voltage).
    /// Measured reference points must start at code 0, end at the maximum
    /// code, increase strictly in code, and not decrease in voltage.
    pub fn characterize(source: &CalibrationSource, full_scale: f64) -> ScopeResult<Self> {
        if !full_scale.is_finite() || full_scale <= 0.0 {
            return Err(ScopeError::Calibration(format!(
                "full scale must be a positive voltage, got {full_scale}"
            )));
        }

        let points = match source {
            CalibrationSource::ManufacturerDefault => vec![
                CalPoint {
                    code: 0,
                    volts: 0.0,
                },
                CalPoint {
                    code: MAX_CODE,
                    volts: full_scale,
                },
            ],
            CalibrationSource::MeasuredReference(points) => {
                validate_reference(points)?;
                points.clone()
            }
        };

        Ok(Self { points, full_scale })
    }

    /// Convert a raw (possibly fractional) code into volts along the
    /// characterization curve. The code is clamped into the legal range.
    pub fn to_voltage(&self, code: f64) -> f64 {
        let code = if code.is_finite() {
            code.clamp(0.0, f64::from(MAX_CODE))
        } else {
            0.0
        };

        let upper = self
            .points
            .partition_point(|p| f64::from(p.code) <= code);
        if upper == 0 {
            return self.points[0].volts;
        }
        if upper == self.points.len() {
            return self.points[upper - 1].volts;
        }

        let lo = self.points[upper - 1];
        let hi = self.points[upper];
        let span = f64::from(hi.code) - f64::from(lo.code);
        let t = (code - f64::from(lo.code)) / span;
        lo.volts + t * (hi.volts - lo.volts)
    }

    /// Convert a voltage into the nearest code on the fixed linear scale,
    /// saturating at the domain boundaries.
    pub fn from_voltage(&self, volts: f64) -> u16 {
        let scaled = (volts / self.full_scale * f64::from(MAX_CODE)).round();
        if scaled <= 0.0 {
            0
        } else if scaled >= f64::from(MAX_CODE) {
            MAX_CODE
        } else {
            scaled as u16
        }
    }

    /// Nominal full-scale voltage of the converter.
    pub fn full_scale(&self) -> f64 {
        self.full_scale
    }

    /// Voltage represented by one code step on the linear scale.
    pub fn code_resolution(&self) -> f64 {
        self.full_scale / f64::from(MAX_CODE)
    }
}

fn validate_reference(points: &[CalPoint]) -> ScopeResult<()> {
    if points.len() < 2 {
        return Err(ScopeError::Calibration(
            "measured reference needs at least two points".into(),
        ));
    }
    let first = points[0];
    let last = points[points.len() - 1];
    if first.code != 0 || last.code != MAX_CODE {
        return Err(ScopeError::Calibration(format!(
            "reference must span codes 0..={MAX_CODE}, got {}..={}",
            first.code, last.code
        )));
    }
    for pair in points.windows(2) {
        if pair[1].code <= pair[0].code {
            return Err(ScopeError::Calibration(format!(
                "reference codes must increase strictly: {} then {}",
                pair[0].code, pair[1].code
            )));
        }
        if !pair[0].volts.is_finite() || !pair[1].volts.is_finite() {
            return Err(ScopeError::Calibration("reference voltage not finite".into()));
        }
        if pair[1].volts < pair[0].volts {
            return Err(ScopeError::Calibration(format!(
                "reference voltages must not decrease: {} then {}",
                pair[0].volts, pair[1].volts
            )));
        }
    }
    Ok(())
}
