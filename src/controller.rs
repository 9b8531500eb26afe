//! Acquisition controller: run-state machine and the client session loop.
//!
//! One cooperative task alternates between polling the link for a command
//! and, while running, performing one acquisition cycle. Commands are
//! applied fully before the next cycle reads the configuration, so a cycle
//! always sees the values committed before it started. The poll window is
//! short while running and long while stopped.
//!
//! Cycle order: refill the sweep buffer, evaluate the trigger against the
//! current level (converted to a code), emit a DATA frame when the policy
//! allows, then handle the Single-shot stop transition.

use crate::acquisition::SamplingPipeline;
use crate::calibration::CalibrationCurve;
use crate::error::{ScopeError, ScopeResult};
use crate::limits::{clamp_sample_rate, DEFAULT_SAMPLE_RATE_HZ, IDLE_POLL, RUN_POLL};
use crate::measurement;
use crate::protocol::{self, Command};
use crate::transport::LinkIo;
use crate::trigger::{self, TriggerEdge, TriggerMode};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, trace, warn};

/// External probe divider compensation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeAttenuation {
    /// Direct connection.
    #[default]
    X1,
    /// 10:1 divider probe.
    X10,
    /// 100:1 divider probe.
    X100,
}

impl ProbeAttenuation {
    /// Map a wire factor onto the nearest supported attenuation. Anything
    /// but 10 or 100 is treated as a direct connection.
    pub fn from_factor(factor: u32) -> Self {
        match factor {
            10 => ProbeAttenuation::X10,
            100 => ProbeAttenuation::X100,
            _ => ProbeAttenuation::X1,
        }
    }

    /// Scale factor applied to reported voltages.
    pub fn factor(self) -> f64 {
        match self {
            ProbeAttenuation::X1 => 1.0,
            ProbeAttenuation::X10 => 10.0,
            ProbeAttenuation::X100 => 100.0,
        }
    }
}

/// Runtime acquisition settings, owned by the controller and mutated only
/// through validated commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionConfig {
    /// Whether cycles run (`Running`) or the loop idles (`Stopped`).
    pub running: bool,
    /// Applied sample rate in Hz, always within the supported range.
    pub sample_rate: u32,
    /// Emission policy.
    pub trigger_mode: TriggerMode,
    /// Trigger level in volts, always within [0, full scale].
    pub trigger_level: f64,
    /// Qualifying crossing direction.
    pub trigger_edge: TriggerEdge,
    /// Probe divider compensation.
    pub probe: ProbeAttenuation,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            running: false,
            sample_rate: DEFAULT_SAMPLE_RATE_HZ,
            trigger_mode: TriggerMode::default(),
            trigger_level: 1.65,
            trigger_edge: TriggerEdge::default(),
            probe: ProbeAttenuation::default(),
        }
    }
}

/// Top-level acquisition state machine bound to one sampling pipeline and
/// one calibration curve.
pub struct Controller {
    pipeline: SamplingPipeline,
    curve: CalibrationCurve,
    config: AcquisitionConfig,
}

impl Controller {
    /// Create a controller with default settings.
    pub fn new(pipeline: SamplingPipeline, curve: CalibrationCurve) -> Self {
        Self {
            pipeline,
            curve,
            config: AcquisitionConfig::default(),
        }
    }

    /// Replace the startup settings (loaded defaults).
    pub fn with_config(mut self, config: AcquisitionConfig) -> Self {
        self.config = AcquisitionConfig {
            sample_rate: clamp_sample_rate(config.sample_rate),
            trigger_level: config.trigger_level.clamp(0.0, self.curve.full_scale()),
            ..config
        };
        self
    }

    /// Current settings.
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Bring the sampling pipeline up at the configured rate.
    pub async fn initialize(&mut self) -> ScopeResult<()> {
        self.pipeline.configure(self.config.sample_rate).await
    }

    /// Serve one client session over `link` until the peer closes it.
    ///
    /// Emits the readiness banner after the pipeline is up, then enters the
    /// poll/acquire loop. Transport errors end the session; acquisition
    /// round faults do not.
    pub async fn run_session<L>(&mut self, link: L) -> ScopeResult<()>
    where
        L: LinkIo,
    {
        let (read_half, write_half) = tokio::io::split(link);
        let mut lines = BufReader::new(read_half).lines();
        let mut writer = write_half;

        self.initialize().await?;
        send_line(&mut writer, protocol::READY_BANNER).await?;
        info!(depth = self.pipeline.depth(), "session open");

        loop {
            let poll = if self.config.running { RUN_POLL } else { IDLE_POLL };
            match tokio::time::timeout(poll, lines.next_line()).await {
                Ok(Ok(Some(line))) => {
                    if let Some(command) = Command::parse(&line) {
                        self.apply(command, &mut writer).await?;
                    } else if !line.trim().is_empty() {
                        debug!(line = %line.trim(), "ignoring unknown command");
                    }
                    // drain queued commands before the next cycle
                    continue;
                }
                Ok(Ok(None)) => {
                    info!("client closed the link");
                    return Ok(());
                }
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => {}
            }

            if self.config.running {
                self.run_cycle(&mut writer).await?;
            }
        }
    }

    /// Apply one validated command, then emit its acknowledgment.
    async fn apply<W>(&mut self, command: Command, writer: &mut W) -> ScopeResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::Start => {
                self.config.running = true;
                info!("acquisition started");
            }
            Command::Stop => {
                self.config.running = false;
                info!("acquisition stopped");
            }
            Command::SetRate(requested) => {
                let rate = clamp_sample_rate(requested);
                if rate != requested {
                    debug!(requested, applied = rate, "sample rate clamped");
                }
                if let Err(err) = self.pipeline.configure(rate).await {
                    warn!(error = %err, rate, "rate change failed, keeping previous rate");
                    return Ok(());
                }
                self.config.sample_rate = rate;
                debug!(rate, "sample rate applied");
            }
            Command::SetTriggerMode(mode) => {
                self.config.trigger_mode = mode;
                debug!(?mode, "trigger mode set");
            }
            Command::SetTriggerLevel(volts) => {
                self.config.trigger_level = volts.clamp(0.0, self.curve.full_scale());
                debug!(volts = self.config.trigger_level, "trigger level set");
            }
            Command::SetTriggerEdge(edge) => {
                self.config.trigger_edge = edge;
                debug!(?edge, "trigger edge set");
            }
            Command::SetProbe(probe) => {
                self.config.probe = probe;
                debug!(?probe, "probe attenuation set");
            }
            Command::GetData => {
                self.forced_emission(writer).await?;
            }
            Command::Status => {
                send_line(writer, &protocol::status_line(&self.config)).await?;
            }
            Command::Ping => {
                send_line(writer, protocol::PONG_RESPONSE).await?;
            }
        }

        if let Some(ack) = command.ack() {
            send_line(writer, ack).await?;
        }
        Ok(())
    }

    /// One acquisition cycle: refill, trigger check, conditional emission.
    async fn run_cycle<W>(&mut self, writer: &mut W) -> ScopeResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        if let Err(err) = self.pipeline.run_round().await {
            return self.recover_round(err).await;
        }

        let level = self.curve.from_voltage(self.config.trigger_level);
        let qualified = trigger::check_trigger(
            self.pipeline.sweep(),
            self.config.trigger_mode,
            level,
            self.config.trigger_edge,
        );

        if qualified {
            self.emit_sweep(writer).await?;
            if self.config.trigger_mode == TriggerMode::Single {
                debug!("single-shot complete, stopping");
                self.config.running = false;
            }
        } else {
            trace!(level, "trigger not found, sweep discarded");
        }
        Ok(())
    }

    /// Force one acquisition and emission, bypassing trigger and run state.
    async fn forced_emission<W>(&mut self, writer: &mut W) -> ScopeResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        if let Err(err) = self.pipeline.run_round().await {
            return self.recover_round(err).await;
        }
        self.emit_sweep(writer).await
    }

    /// Render and send a DATA frame for the current sweep.
    async fn emit_sweep<W>(&self, writer: &mut W) -> ScopeResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let samples = self.pipeline.sweep();
        let snapshot = measurement::analyze(
            samples,
            self.config.sample_rate,
            &self.curve,
            self.config.probe.factor(),
        );
        let frame = protocol::data_frame(self.config.sample_rate, &snapshot, samples);
        send_line(writer, &frame).await?;
        trace!(
            vpp = snapshot.vpp,
            freq = snapshot.freq.frequency,
            "DATA frame emitted"
        );
        Ok(())
    }

    /// Handle a failed round: discard the sweep and restart the pipeline.
    ///
    /// A restart failure drops the controller to Stopped; the session keeps
    /// serving commands either way. Non-round faults propagate.
    async fn recover_round(&mut self, err: ScopeError) -> ScopeResult<()> {
        if !err.is_round_fault() {
            return Err(err);
        }
        warn!(error = %err, "acquisition round failed, sweep discarded");
        if let Err(restart) = self.pipeline.configure(self.config.sample_rate).await {
            error!(error = %restart, "pipeline restart failed, stopping acquisition");
            self.config.running = false;
        }
        Ok(())
    }
}

/// Write one protocol line with its terminator and flush it out.
async fn send_line<W>(writer: &mut W, line: &str) -> ScopeResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
