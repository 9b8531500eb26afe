//! # Rust Scope Core Library
//!
//! This crate is the core library of the `rust_scope` application, a
//! single-channel digital storage oscilloscope front end. It captures
//! fixed-depth sweeps from a sample source, derives waveform measurements,
//! applies trigger qualification, and serves a line-oriented text protocol
//! that a visualization client drives over TCP or a serial link.
//!
//! ## Crate Structure
//!
//! - **`acquisition`**: The sweep buffer and the sampling pipeline that
//!   fills it from a [`hardware::SampleSource`].
//! - **`calibration`**: Piecewise-linear code-to-voltage conversion built
//!   from manufacturer or measured reference points.
//! - **`config`**: Figment-based configuration loading with environment
//!   overrides. See [`config::ScopeConfig`].
//! - **`controller`**: The acquisition state machine tying command
//!   handling, sampling, triggering, and frame emission together.
//! - **`error`**: The [`error::ScopeError`] enum used across the crate.
//! - **`filters`**: Scalar smoothing filters applied to measurements.
//! - **`hardware`**: The sample-source capability trait and the simulated
//!   signal generator.
//! - **`limits`**: Shared numeric limits and canonical link parameters.
//! - **`logging`**: Tracing subscriber setup.
//! - **`measurement`**: Sweep statistics, frequency estimation, and signal
//!   detection.
//! - **`protocol`**: Command parsing and response formatting for the wire
//!   protocol.
//! - **`transport`**: Link abstractions shared by the TCP and serial
//!   transports.
//! - **`trigger`**: Trigger modes, edges, and crossing detection.

pub mod acquisition;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod error;
pub mod filters;
pub mod hardware;
pub mod limits;
pub mod logging;
pub mod measurement;
pub mod protocol;
pub mod transport;
pub mod trigger;
