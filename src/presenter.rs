//! Presentation boundary.
//!
//! The 3D scene lives outside this crate. What it needs is defined here:
//! the [`ScenePresenter`] trait it implements, the cosmetic rotation model
//! that turns the clock ratio into two spin speeds, and a [`RenderLoop`]
//! that feeds presenters on their own frame cadence. Data flows one way
//! only: presenters read snapshots and never write back.

use std::io::Write;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use serde::Serialize;

use crate::config::SimulationConfig;
use crate::constants::BASE_ROTATION_SPEED;
use crate::error::{ExecutionError, GargantuaResult};
use crate::format::{dilation_summary, format_grouped, TimeReadout};
use crate::runtime::SnapshotCell;
use crate::session::SimulationSnapshot;

/// Per-frame spin of the two planets, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotationSpeeds {
    /// Earth (reference clock).
    pub reference: f64,
    /// Miller's planet (dilated clock).
    pub dilated: f64,
}

/// Maps the clock ratio onto rotation speeds.
///
/// Earth spins at a constant base speed; Miller's planet spins slower by
/// the observed reference/dilated ratio. Before any dilated time has
/// elapsed the current factor stands in for the ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationModel {
    /// Earth's spin per frame, in radians.
    pub base_speed: f64,
}

impl Default for RotationModel {
    fn default() -> Self {
        Self {
            base_speed: BASE_ROTATION_SPEED,
        }
    }
}

impl RotationModel {
    /// Speeds for the clocks captured in `snapshot`.
    #[must_use]
    pub fn speeds(&self, snapshot: &SimulationSnapshot) -> RotationSpeeds {
        let ratio = snapshot
            .clocks()
            .observed_ratio()
            .filter(|r| r.is_finite() && *r >= 1.0)
            .unwrap_or_else(|| snapshot.dilation_factor.value());
        RotationSpeeds {
            reference: self.base_speed,
            dilated: self.base_speed / ratio,
        }
    }
}

/// Accumulated rotation angles of both bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BodyRotation {
    /// Earth's angle in `[0, 2π)`.
    pub reference_angle: f64,
    /// Miller's planet's angle in `[0, 2π)`.
    pub dilated_angle: f64,
}

impl BodyRotation {
    /// Spins both bodies by one frame.
    pub fn advance(&mut self, speeds: RotationSpeeds) {
        self.reference_angle = (self.reference_angle + speeds.reference) % std::f64::consts::TAU;
        self.dilated_angle = (self.dilated_angle + speeds.dilated) % std::f64::consts::TAU;
    }
}

/// Everything a presenter receives for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    /// Frame counter, starting at 0.
    pub index: u64,
    /// Latest published snapshot.
    pub snapshot: SimulationSnapshot,
    /// Spin applied this frame.
    pub speeds: RotationSpeeds,
    /// Angles after this frame's spin.
    pub rotation: BodyRotation,
    /// Whether the snapshot changed since the previous frame.
    pub changed: bool,
}

/// Consumer of simulation state. Implemented by the scene.
pub trait ScenePresenter: Send {
    /// Renders one frame.
    ///
    /// # Errors
    ///
    /// Implementations report output failures; the render loop logs them
    /// and keeps going.
    fn present(&mut self, frame: &Frame) -> GargantuaResult<()>;
}

/// Text presenter: one readout line per changed snapshot.
#[derive(Debug)]
pub struct TextPresenter<W: Write> {
    out: W,
    json: bool,
    mass_symbol: &'static str,
    distance_symbol: &'static str,
}

impl<W: Write> TextPresenter<W> {
    /// Text presenter writing to `out`, labelled with the configured units.
    #[must_use]
    pub fn new(out: W, config: &SimulationConfig) -> Self {
        Self {
            out,
            json: false,
            mass_symbol: config.mass_unit.symbol(),
            distance_symbol: config.distance_unit.symbol(),
        }
    }

    /// Emit one JSON snapshot per line instead of text.
    #[must_use]
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Hands back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Formats one snapshot as a human-readable line.
    #[must_use]
    pub fn render_line(&self, snapshot: &SimulationSnapshot) -> String {
        let readout = TimeReadout::new(&snapshot.clocks());
        format!(
            "Earth {} ({}) | Miller {} ({}) | {} {} at {} {} | {} dilation{}",
            readout.reference.clock,
            readout.reference.span,
            readout.dilated.clock,
            readout.dilated.span,
            format_grouped(snapshot.mass),
            self.mass_symbol,
            format_grouped(snapshot.distance),
            self.distance_symbol,
            snapshot.dilation_factor,
            if snapshot.factor_source.is_fallback() {
                " (fallback)"
            } else {
                ""
            }
        )
    }

    /// The summary line printed once per parameter change.
    #[must_use]
    pub fn render_summary(snapshot: &SimulationSnapshot) -> String {
        dilation_summary(snapshot.dilation_factor)
    }
}

impl<W: Write + Send> ScenePresenter for TextPresenter<W> {
    fn present(&mut self, frame: &Frame) -> GargantuaResult<()> {
        if !frame.changed {
            return Ok(());
        }
        let line = if self.json {
            serde_json::to_string(&frame.snapshot).map_err(|e| ExecutionError::Presenter {
                message: e.to_string(),
            })?
        } else {
            self.render_line(&frame.snapshot)
        };
        writeln!(self.out, "{line}").map_err(|e| ExecutionError::Presenter {
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Drives a presenter from a [`SnapshotCell`] at a fixed frame interval.
///
/// Runs on its own thread, decoupled from the simulation tick. Stopping
/// hands the presenter back.
pub struct RenderLoop<P: ScenePresenter + 'static> {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<P>>,
}

impl<P: ScenePresenter + 'static> RenderLoop<P> {
    /// Spawns the render loop.
    #[must_use]
    pub fn spawn(cell: Arc<SnapshotCell>, presenter: P, model: RotationModel, frame_interval: Duration) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let join = thread::Builder::new()
            .name("gargantua-render".to_string())
            .spawn(move || {
                let mut presenter = presenter;
                let frames = tick(frame_interval);
                let mut rotation = BodyRotation::default();
                let mut last_version = None;
                let mut index = 0_u64;
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(frames) -> _ => {
                            let version = cell.version();
                            let snapshot = cell.load();
                            let speeds = model.speeds(&snapshot);
                            rotation.advance(speeds);
                            let frame = Frame {
                                index,
                                snapshot,
                                speeds,
                                rotation,
                                changed: last_version != Some(version),
                            };
                            last_version = Some(version);
                            index += 1;
                            if let Err(err) = presenter.present(&frame) {
                                tracing::warn!(error = %err, frame = frame.index, "presenter failed");
                            }
                        }
                    }
                }
                presenter
            })
            .expect("failed to spawn gargantua render worker");

        Self {
            stop_tx: Some(stop_tx),
            join: Some(join),
        }
    }

    /// Stops the loop and returns the presenter, if its thread exited
    /// cleanly.
    pub fn stop(mut self) -> Option<P> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<P> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
        self.join.take().and_then(|join| join.join().ok())
    }
}

impl<P: ScenePresenter + 'static> Drop for RenderLoop<P> {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
