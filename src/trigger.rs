//! Trigger configuration types and the per-round trigger scan.
//!
//! The scan is stateless: every acquisition round is evaluated fresh against
//! the current level and edge, and a round without a qualifying crossing is
//! simply not emitted. Nothing is latched across rounds, so this is a
//! polling trigger rather than a hardware edge capture.

use serde::{Deserialize, Serialize};

/// Emission policy for acquisition rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Emit every round regardless of trigger state.
    #[default]
    Auto,
    /// Emit only rounds containing a qualifying edge.
    Normal,
    /// Like Normal, but stop after the first emission.
    Single,
}

impl TriggerMode {
    /// Map a wire index onto the nearest mode. Out-of-range values clamp.
    pub fn from_index(index: i64) -> Self {
        match index.clamp(0, 2) {
            0 => TriggerMode::Auto,
            1 => TriggerMode::Normal,
            _ => TriggerMode::Single,
        }
    }

    /// Wire index of this mode.
    pub fn index(self) -> u8 {
        match self {
            TriggerMode::Auto => 0,
            TriggerMode::Normal => 1,
            TriggerMode::Single => 2,
        }
    }
}

/// Which crossing direction qualifies as a trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEdge {
    /// Crossing from above the level to at-or-below it.
    Falling,
    /// Crossing from below the level to at-or-above it.
    #[default]
    Rising,
}

impl TriggerEdge {
    /// Map a wire index onto the nearest edge. Out-of-range values clamp.
    pub fn from_index(index: i64) -> Self {
        match index.clamp(0, 1) {
            0 => TriggerEdge::Falling,
            _ => TriggerEdge::Rising,
        }
    }

    /// Wire index of this edge.
    pub fn index(self) -> u8 {
        match self {
            TriggerEdge::Falling => 0,
            TriggerEdge::Rising => 1,
        }
    }
}

/// Decide whether one acquisition round qualifies for emission.
///
/// Auto mode qualifies unconditionally. Otherwise the buffer is scanned in
/// order for the first adjacent pair crossing `level` in the configured
/// direction; a buffer with no such pair does not qualify.
pub fn check_trigger(samples: &[u16], mode: TriggerMode, level: u16, edge: TriggerEdge) -> bool {
    if mode == TriggerMode::Auto {
        return true;
    }

    samples.windows(2).any(|pair| match edge {
        TriggerEdge::Rising => pair[0] < level && pair[1] >= level,
        TriggerEdge::Falling => pair[0] > level && pair[1] <= level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_mode_always_qualifies() {
        assert!(check_trigger(&[], TriggerMode::Auto, 2000, TriggerEdge::Rising));
        assert!(check_trigger(&[0, 0, 0], TriggerMode::Auto, 2000, TriggerEdge::Rising));
        assert!(check_trigger(
            &[4095; 16],
            TriggerMode::Auto,
            0,
            TriggerEdge::Falling
        ));
    }

    #[test]
    fn rising_edge_found_on_upward_crossing() {
        let samples = [100, 500, 1999, 2000, 2500];
        assert!(check_trigger(
            &samples,
            TriggerMode::Normal,
            2000,
            TriggerEdge::Rising
        ));
    }

    #[test]
    fn rising_edge_never_fires_on_decreasing_buffer() {
        let samples: Vec<u16> = (0..200).map(|i| 4000 - i * 20).collect();
        assert!(!check_trigger(
            &samples,
            TriggerMode::Normal,
            2000,
            TriggerEdge::Rising
        ));
    }

    #[test]
    fn falling_edge_found_on_downward_crossing() {
        let samples = [3000, 2100, 2000, 1500];
        assert!(check_trigger(
            &samples,
            TriggerMode::Single,
            2000,
            TriggerEdge::Falling
        ));
        assert!(!check_trigger(
            &samples,
            TriggerMode::Single,
            2000,
            TriggerEdge::Rising
        ));
    }

    #[test]
    fn sample_already_at_level_does_not_count_as_crossing() {
        // rising requires the previous sample strictly below the level
        let samples = [2000, 2000, 2000];
        assert!(!check_trigger(
            &samples,
            TriggerMode::Normal,
            2000,
            TriggerEdge::Rising
        ));
    }

    #[test]
    fn short_buffers_cannot_qualify_outside_auto() {
        assert!(!check_trigger(&[], TriggerMode::Normal, 100, TriggerEdge::Rising));
        assert!(!check_trigger(&[500], TriggerMode::Normal, 100, TriggerEdge::Rising));
    }

    #[test]
    fn indices_clamp_onto_closed_enums() {
        assert_eq!(TriggerMode::from_index(-5), TriggerMode::Auto);
        assert_eq!(TriggerMode::from_index(1), TriggerMode::Normal);
        assert_eq!(TriggerMode::from_index(2), TriggerMode::Single);
        assert_eq!(TriggerMode::from_index(99), TriggerMode::Single);
        assert_eq!(TriggerEdge::from_index(0), TriggerEdge::Falling);
        assert_eq!(TriggerEdge::from_index(1), TriggerEdge::Rising);
        assert_eq!(TriggerEdge::from_index(7), TriggerEdge::Rising);
        assert_eq!(TriggerEdge::from_index(-1), TriggerEdge::Falling);
    }
}
