//! Session state: the single owner of parameters, factor and clocks.
//!
//! A `Session` is an explicit state object; nothing in the crate keeps
//! simulation state in globals. All mutations go through `&mut self`, so a
//! session is only ever changed by one logical thread of control.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::ClockPair;
use crate::config::SimulationConfig;
use crate::dilation::{evaluate_dilation, DilationEvaluation, DilationFactor, FactorSource};
use crate::params::{clamp_parameters, RawParameters, SimulationParameters};

/// Stable identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-driven change to the simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "control", content = "value")]
pub enum ControlEvent {
    /// New black-hole mass, in the configured mass unit.
    SetMass(f64),
    /// New orbital distance, in the configured distance unit.
    SetDistance(f64),
    /// Both parameters at once.
    SetParameters(RawParameters),
}

/// Read-only view of a session at one instant.
///
/// This is everything the presentation side may consume. It is `Copy`, so
/// holders of a snapshot never alias session state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Session this snapshot belongs to.
    pub session_id: SessionId,
    /// Far-observer clock, in seconds.
    pub reference_time: f64,
    /// Near-observer clock, in seconds.
    pub dilated_time: f64,
    /// Factor in effect for the next tick.
    pub dilation_factor: DilationFactor,
    /// Where that factor came from.
    pub factor_source: FactorSource,
    /// Black-hole mass, in the configured mass unit.
    pub mass: f64,
    /// Orbital distance, in the configured distance unit.
    pub distance: f64,
    /// Number of ticks applied so far.
    pub ticks: u64,
    /// Wall-clock capture time.
    pub captured_at: DateTime<Utc>,
}

impl SimulationSnapshot {
    /// The clock pair captured in this snapshot.
    #[must_use]
    pub const fn clocks(&self) -> ClockPair {
        ClockPair::at(self.reference_time, self.dilated_time)
    }
}

/// One simulation session.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    config: SimulationConfig,
    params: SimulationParameters,
    evaluation: DilationEvaluation,
    clocks: ClockPair,
    ticks: u64,
}

impl Session {
    /// Starts a session at the configured default parameters with both
    /// clocks at zero.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let params = SimulationParameters::defaults(&config);
        let evaluation = evaluate_dilation(params.mass(), params.distance(), &config);
        let session = Self {
            id: SessionId::new(),
            started_at: Utc::now(),
            config,
            params,
            evaluation,
            clocks: ClockPair::default(),
            ticks: 0,
        };
        tracing::info!(
            session = %session.id,
            mass = params.mass(),
            distance = params.distance(),
            factor = session.evaluation.factor.value(),
            "session started"
        );
        session
    }

    /// Rebuilds a session from its last published snapshot.
    ///
    /// Parameters are re-clamped and the factor re-evaluated against
    /// `config`; identity, clocks and tick count carry over.
    pub(crate) fn restore(
        config: SimulationConfig,
        started_at: DateTime<Utc>,
        snapshot: &SimulationSnapshot,
    ) -> Self {
        let raw = RawParameters {
            mass: snapshot.mass,
            distance: snapshot.distance,
        };
        let params = clamp_parameters(raw, &config);
        let evaluation = evaluate_dilation(params.mass(), params.distance(), &config);
        Self {
            id: snapshot.session_id,
            started_at,
            config,
            params,
            evaluation,
            clocks: snapshot.clocks(),
            ticks: snapshot.ticks,
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// When the session was created.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Configuration the session was created with.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current clamped parameters.
    #[must_use]
    pub const fn parameters(&self) -> SimulationParameters {
        self.params
    }

    /// Current factor and its provenance.
    #[must_use]
    pub const fn evaluation(&self) -> DilationEvaluation {
        self.evaluation
    }

    /// Current factor.
    #[must_use]
    pub const fn dilation_factor(&self) -> DilationFactor {
        self.evaluation.factor
    }

    /// Both clocks.
    #[must_use]
    pub const fn clocks(&self) -> ClockPair {
        self.clocks
    }

    /// Ticks applied so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Clamps and applies a new mass, then recomputes the factor.
    pub fn set_mass(&mut self, mass: f64) -> DilationEvaluation {
        self.apply(ControlEvent::SetMass(mass))
    }

    /// Clamps and applies a new distance, then recomputes the factor.
    pub fn set_distance(&mut self, distance: f64) -> DilationEvaluation {
        self.apply(ControlEvent::SetDistance(distance))
    }

    /// Applies a control event synchronously.
    ///
    /// Clamping is silent; the factor is recomputed before this returns and
    /// is used from the next tick on.
    pub fn apply(&mut self, event: ControlEvent) -> DilationEvaluation {
        self.params = match event {
            ControlEvent::SetMass(mass) => self.params.with_mass(mass, &self.config),
            ControlEvent::SetDistance(distance) => self.params.with_distance(distance, &self.config),
            ControlEvent::SetParameters(raw) => clamp_parameters(raw, &self.config),
        };
        self.evaluation = evaluate_dilation(self.params.mass(), self.params.distance(), &self.config);
        tracing::debug!(
            session = %self.id,
            ?event,
            mass = self.params.mass(),
            distance = self.params.distance(),
            factor = self.evaluation.factor.value(),
            "parameters updated"
        );
        self.evaluation
    }

    /// Advances both clocks by one configured tick interval.
    pub fn tick(&mut self) {
        self.clocks
            .advance(self.config.tick_interval_secs(), self.evaluation.factor);
        self.ticks += 1;
        tracing::trace!(
            session = %self.id,
            ticks = self.ticks,
            reference = self.clocks.reference_time(),
            dilated = self.clocks.dilated_time(),
            "tick"
        );
    }

    /// Captures the current read-only view.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            session_id: self.id,
            reference_time: self.clocks.reference_time(),
            dilated_time: self.clocks.dilated_time(),
            dilation_factor: self.evaluation.factor,
            factor_source: self.evaluation.source,
            mass: self.params.mass(),
            distance: self.params.distance(),
            ticks: self.ticks,
            captured_at: Utc::now(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MOVIE_DILATION_FACTOR;
    use crate::dilation::{schwarzschild_radius, FallbackReason};

    #[test]
    fn new_session_starts_at_defaults() {
        let session = Session::default();
        let config = SimulationConfig::default();
        assert_eq!(session.parameters(), SimulationParameters::defaults(&config));
        assert_eq!(session.clocks(), ClockPair::default());
        assert_eq!(session.ticks(), 0);
        assert_eq!(session.evaluation().source, FactorSource::Computed);
        assert!(session.dilation_factor().value() > 1.0);
    }

    #[test]
    fn ticks_accumulate_with_current_factor() {
        let mut session = Session::default();
        let f = session.dilation_factor().value();
        for _ in 0..10 {
            session.tick();
        }
        let snap = session.snapshot();
        assert_eq!(snap.ticks, 10);
        assert_eq!(snap.reference_time, 10.0);
        assert!((snap.dilated_time - 10.0 / f).abs() < 1e-9);
    }

    #[test]
    fn restore_carries_identity_and_clocks() {
        let mut session = Session::default();
        session.set_distance(3.0e9);
        for _ in 0..7 {
            session.tick();
        }
        let snap = session.snapshot();

        let restored = Session::restore(session.config().clone(), session.started_at(), &snap);
        assert_eq!(restored.id(), session.id());
        assert_eq!(restored.started_at(), session.started_at());
        assert_eq!(restored.clocks(), session.clocks());
        assert_eq!(restored.ticks(), 7);
        assert_eq!(restored.parameters(), session.parameters());
        assert_eq!(restored.evaluation(), session.evaluation());
    }

    #[test]
    fn parameter_change_applies_to_future_ticks_only() {
        let mut session = Session::default();
        let first = session.dilation_factor().value();
        for _ in 0..5 {
            session.tick();
        }
        let dilated_before = session.clocks().dilated_time();

        let eval = session.set_distance(3.0e9);
        assert_eq!(eval.source, FactorSource::Computed);
        let second = eval.factor.value();
        assert!(second < first);
        assert_eq!(session.clocks().dilated_time(), dilated_before);

        session.tick();
        let expected = 5.0 / first + 1.0 / second;
        assert!((session.clocks().dilated_time() - expected).abs() < 1e-9);
    }

    #[test]
    fn control_events_are_clamped() {
        let mut session = Session::default();
        session.apply(ControlEvent::SetParameters(RawParameters {
            mass: -5.0,
            distance: 1.0e15,
        }));
        let params = session.parameters();
        assert_eq!(params.mass(), session.config().mass.min);
        assert_eq!(params.distance(), session.config().distance.max);
    }

    #[test]
    fn fallback_is_visible_in_snapshot() {
        // Widen the distance range past the horizon so a caller can reach it.
        let mut config = SimulationConfig::default();
        config.distance.min = 1.0;
        let horizon = schwarzschild_radius(config.mass.default, &config);
        let mut session = Session::new(config);

        session.set_distance(horizon / 2.0);
        let snap = session.snapshot();
        assert_eq!(snap.dilation_factor.value(), MOVIE_DILATION_FACTOR);
        assert_eq!(
            snap.factor_source,
            FactorSource::Fallback(FallbackReason::InsideHorizon)
        );
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let session = Session::default();
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(json["ticks"], 0);
        assert_eq!(json["factor_source"]["kind"], "computed");
        assert_eq!(json["session_id"], session.id().to_string());
    }

    #[test]
    fn snapshot_rebuilds_clocks() {
        let mut session = Session::default();
        for _ in 0..4 {
            session.tick();
        }
        let rebuilt = session.snapshot().clocks();
        assert_eq!(rebuilt.reference_time(), 4.0);
        assert!((rebuilt.dilated_time() - session.clocks().dilated_time()).abs() < 1e-9);
    }
}
