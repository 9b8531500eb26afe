//! Hardware seam for the acquisition pipeline.
//!
//! The core never touches converter registers directly; everything it needs
//! from the board is the narrow [`SampleSource`] capability. Production
//! builds wire in a DMA-backed ADC driver; tests and the simulated daemon
//! use [`sim::SimulatedAdc`].

pub mod sim;

pub use sim::{SimTiming, SimulatedAdc, Waveform};

use crate::error::ScopeResult;
use async_trait::async_trait;

/// Capability: raw sample acquisition.
///
/// # Contract
/// - `configure` may be called repeatedly to change the rate; it must leave
///   the sampling pipeline fully enabled afterwards, never half-configured.
/// - `fill` performs one complete acquisition round into `buffer`, returning
///   only when every slot holds a fresh reading. No partial round is ever
///   observable. Its await is the controller's sole suspension point, with a
///   worst-case latency of one sweep at the configured rate plus transfer
///   overhead.
/// - Codes wider than 12 bits may be produced by the transfer granularity;
///   callers mask to the legal range.
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// (Re)initialize the sampling pipeline for `sample_rate` Hz.
    async fn configure(&mut self, sample_rate: u32) -> ScopeResult<()>;

    /// Run one acquisition round, overwriting `buffer` completely.
    async fn fill(&mut self, buffer: &mut [u16]) -> ScopeResult<()>;
}
