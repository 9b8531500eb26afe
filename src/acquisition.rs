//! Sweep buffer ownership and the sampling pipeline.
//!
//! The [`SamplingPipeline`] is the buffer manager of the acquisition core:
//! it owns the sample source and the one sweep buffer, drives complete
//! acquisition rounds, and applies the 12-bit code mask before anyone else
//! sees the data. Readers only ever get an immutable snapshot of a fully
//! refilled buffer; a failed round never exposes partial contents.

use crate::error::{ScopeError, ScopeResult};
use crate::hardware::SampleSource;
use crate::limits::{BUFFER_DEPTH, CODE_MASK, ROUND_TIMEOUT};
use std::time::Duration;
use tracing::trace;

/// Fixed-capacity sweep buffer, overwritten wholesale on each refill.
#[derive(Debug)]
pub struct AcquisitionBuffer {
    samples: Vec<u16>,
}

impl AcquisitionBuffer {
    /// Allocate a buffer of `depth` samples.
    pub fn new(depth: usize) -> Self {
        Self {
            samples: vec![0; depth],
        }
    }

    /// Number of samples per sweep.
    pub fn depth(&self) -> usize {
        self.samples.len()
    }

    /// Immutable snapshot of the last completed sweep.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    fn samples_mut(&mut self) -> &mut [u16] {
        &mut self.samples
    }
}

impl Default for AcquisitionBuffer {
    fn default() -> Self {
        Self::new(BUFFER_DEPTH)
    }
}

/// A sample source plus the sweep buffer it fills.
pub struct SamplingPipeline {
    source: Box<dyn SampleSource>,
    buffer: AcquisitionBuffer,
    round_timeout: Duration,
}

impl SamplingPipeline {
    /// Wrap `source` with a sweep buffer of `depth` samples.
    pub fn new(source: Box<dyn SampleSource>, depth: usize) -> Self {
        Self {
            source,
            buffer: AcquisitionBuffer::new(depth),
            round_timeout: ROUND_TIMEOUT,
        }
    }

    /// Override the per-round timeout. Tests use short windows.
    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    /// Samples per sweep.
    pub fn depth(&self) -> usize {
        self.buffer.depth()
    }

    /// (Re)initialize the source for `sample_rate` Hz.
    ///
    /// Delegates the disable-retune-enable sequence to the source; on return
    /// the pipeline is fully enabled at the new rate.
    pub async fn configure(&mut self, sample_rate: u32) -> ScopeResult<()> {
        self.source.configure(sample_rate).await
    }

    /// Run one complete acquisition round, overwriting the sweep buffer.
    ///
    /// A round that outlives the timeout is abandoned and reported as an
    /// [`ScopeError::AcquisitionTimeout`]. On any error the previous sweep
    /// contents are considered discarded; only a successful round hands
    /// readers a valid snapshot via [`sweep`](Self::sweep).
    pub async fn run_round(&mut self) -> ScopeResult<()> {
        let fill = self.source.fill(self.buffer.samples_mut());
        match tokio::time::timeout(self.round_timeout, fill).await {
            Ok(result) => result?,
            Err(_) => return Err(ScopeError::AcquisitionTimeout(self.round_timeout)),
        }

        for sample in self.buffer.samples_mut() {
            *sample &= CODE_MASK;
        }
        trace!(depth = self.buffer.depth(), "acquisition round complete");
        Ok(())
    }

    /// Masked snapshot of the last successful round.
    pub fn sweep(&self) -> &[u16] {
        self.buffer.samples()
    }
}
