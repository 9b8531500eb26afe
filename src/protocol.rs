//! Wire protocol: inbound command grammar and outbound line rendering.
//!
//! Everything here is pure. [`Command::parse`] turns one received line into
//! an already-validated command (closed enumerations are clamped during
//! parsing, so an out-of-range mode or probe factor can never reach the
//! configuration), and the rendering functions produce response lines
//! without the trailing newline; the session loop appends it and flushes.
//!
//! Lines that parse as no known command yield `None` and are dropped
//! without any response on the wire.

use crate::controller::{AcquisitionConfig, ProbeAttenuation};
use crate::measurement::MeasurementSnapshot;
use crate::trigger::{TriggerEdge, TriggerMode};
use std::fmt::Write as _;

/// Readiness signal emitted once calibration and the sampling pipeline are
/// up. Clients must not send commands before observing it.
pub const READY_BANNER: &str = "ESP32_OSC_READY";

/// Reply to a liveness check.
pub const PONG_RESPONSE: &str = "PONG";

/// One validated inbound command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Begin continuous acquisition.
    Start,
    /// Halt acquisition.
    Stop,
    /// Request a sample-rate change (Hz, clamped at apply time).
    SetRate(u32),
    /// Select the emission policy.
    SetTriggerMode(TriggerMode),
    /// Set the trigger level in volts.
    SetTriggerLevel(f64),
    /// Select the qualifying crossing direction.
    SetTriggerEdge(TriggerEdge),
    /// Set the probe divider compensation.
    SetProbe(ProbeAttenuation),
    /// Force one DATA emission regardless of run state or trigger.
    GetData,
    /// Request the status line.
    Status,
    /// Liveness check.
    Ping,
}

impl Command {
    /// Parse one received line. Keywords are case-sensitive; surrounding
    /// whitespace is ignored. Returns `None` for anything unrecognized.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        match line {
            "START" => return Some(Command::Start),
            "STOP" => return Some(Command::Stop),
            "GET_DATA" => return Some(Command::GetData),
            "STATUS" => return Some(Command::Status),
            "PING" => return Some(Command::Ping),
            _ => {}
        }

        let (keyword, value) = line.split_once(':')?;
        match keyword {
            "RATE" => value.parse::<u32>().ok().map(Command::SetRate),
            "TRIG_MODE" => value
                .parse::<i64>()
                .ok()
                .map(|index| Command::SetTriggerMode(TriggerMode::from_index(index))),
            "TRIG_LEVEL" => value
                .parse::<f64>()
                .ok()
                .filter(|volts| volts.is_finite())
                .map(Command::SetTriggerLevel),
            "TRIG_EDGE" => value
                .parse::<i64>()
                .ok()
                .map(|index| Command::SetTriggerEdge(TriggerEdge::from_index(index))),
            "PROBE" => value
                .parse::<u32>()
                .ok()
                .map(|factor| Command::SetProbe(ProbeAttenuation::from_factor(factor))),
            _ => None,
        }
    }

    /// Acknowledgment line for commands that are acked after taking effect.
    pub fn ack(&self) -> Option<&'static str> {
        match self {
            Command::Start => Some("ACK:START"),
            Command::Stop => Some("ACK:STOP"),
            Command::SetRate(_) => Some("ACK:RATE"),
            Command::SetTriggerMode(_) => Some("ACK:TRIG_MODE"),
            Command::SetTriggerLevel(_) => Some("ACK:TRIG_LEVEL"),
            Command::SetTriggerEdge(_) => Some("ACK:TRIG_EDGE"),
            Command::SetProbe(_) => Some("ACK:PROBE"),
            Command::GetData | Command::Status | Command::Ping => None,
        }
    }
}

/// Render the `STATUS` response for the current configuration.
pub fn status_line(config: &AcquisitionConfig) -> String {
    format!(
        "STATUS:{},{},{},{:.2},{}",
        u8::from(config.running),
        config.sample_rate,
        config.trigger_mode.index(),
        config.trigger_level,
        config.trigger_edge.index()
    )
}

/// Render one DATA frame: header fields followed by the raw sweep.
///
/// `vpp` and `vmean` in the snapshot are already probe-scaled; the samples
/// stay unscaled 12-bit codes.
pub fn data_frame(sample_rate: u32, snapshot: &MeasurementSnapshot, samples: &[u16]) -> String {
    let mut frame = String::with_capacity(40 + samples.len() * 5);
    let _ = write!(
        frame,
        "DATA:{},{:.2},{:.3},{:.3}",
        sample_rate, snapshot.freq.frequency, snapshot.vpp, snapshot.vmean
    );
    for sample in samples {
        let _ = write!(frame, ",{sample}");
    }
    frame
}
