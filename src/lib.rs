//! # Gargantua - gravitational time dilation explorer core
//!
//! Gargantua drives an Interstellar-style "Miller's planet" explorer. Two
//! sliders choose a black-hole mass and an orbital distance; the engine turns
//! them into a Schwarzschild time dilation factor and runs two clocks side by
//! side, one for a distant observer and one for the orbiting planet.
//!
//! ## Core Concepts
//!
//! - **DilationFactor**: `1 / sqrt(1 - 2GM/(rc²))`, always finite and `>= 1`,
//!   with a named fallback for orbits at or inside the horizon
//! - **SimulationParameters**: mass and distance, clamped to configured bounds
//! - **ClockPair**: reference and dilated clocks advanced once per tick
//! - **SessionRuntime**: the fixed-interval tick loop with idempotent teardown
//! - **SimulationSnapshot**: the read-only view handed to presenters
//!
//! ## Usage
//!
//! ```rust
//! use gargantua::{Session, SimulationConfig};
//!
//! let mut session = Session::new(SimulationConfig::default());
//! session.set_distance(1.0e9);
//! session.tick();
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.reference_time, 1.0);
//! assert!(snapshot.dilated_time < 1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Physics core
pub mod clock;
pub mod config;
pub mod constants;
pub mod dilation;
pub mod error;
pub mod params;

// Session, tick loop and presentation boundary
pub mod format;
pub mod presenter;
pub mod runtime;
pub mod session;
pub mod telemetry;

// Re-export primary types at crate root for convenience
pub use clock::ClockPair;
pub use config::{DistanceUnit, FallbackPolicy, MassUnit, ParameterBounds, SimulationConfig};
pub use dilation::{
    compute_dilation_factor, evaluate_dilation, schwarzschild_radius, DilationEvaluation,
    DilationFactor, FactorSource, FallbackReason,
};
pub use error::{ConfigError, ExecutionError, GargantuaError, GargantuaResult, ValidationError};
pub use params::{clamp_parameters, RawParameters, SimulationParameters};
pub use presenter::{
    BodyRotation, Frame, RenderLoop, RotationModel, RotationSpeeds, ScenePresenter, TextPresenter,
};
pub use runtime::{RuntimeConfig, RuntimeState, SessionRuntime, SnapshotCell, StopOutcome};
pub use session::{ControlEvent, Session, SessionId, SimulationSnapshot};
