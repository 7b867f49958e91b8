//! Simulation parameters and clamping.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;

/// Unvalidated parameters as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawParameters {
    /// Black-hole mass, in the configured mass unit.
    pub mass: f64,
    /// Orbital distance, in the configured distance unit.
    pub distance: f64,
}

/// Black-hole mass and orbital distance, always inside the configured
/// bounds.
///
/// Only [`clamp_parameters`] and [`SimulationParameters::defaults`] build
/// values of this type, so every instance satisfies the bounds it was
/// clamped against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParameters {
    mass: f64,
    distance: f64,
}

impl SimulationParameters {
    /// Session-start parameters: the configured defaults, clamped.
    #[must_use]
    pub fn defaults(config: &SimulationConfig) -> Self {
        clamp_parameters(
            RawParameters {
                mass: config.mass.default,
                distance: config.distance.default,
            },
            config,
        )
    }

    /// Black-hole mass, in the configured mass unit.
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Orbital distance, in the configured distance unit.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Returns a copy with a new (clamped) mass.
    #[must_use]
    pub fn with_mass(self, mass: f64, config: &SimulationConfig) -> Self {
        Self {
            mass: config.mass.clamp(mass),
            ..self
        }
    }

    /// Returns a copy with a new (clamped) distance.
    #[must_use]
    pub fn with_distance(self, distance: f64, config: &SimulationConfig) -> Self {
        Self {
            distance: config.distance.clamp(distance),
            ..self
        }
    }
}

impl From<SimulationParameters> for RawParameters {
    fn from(params: SimulationParameters) -> Self {
        Self {
            mass: params.mass,
            distance: params.distance,
        }
    }
}

/// Clamps each field into its configured `[min, max]` range.
///
/// Out-of-range input is silently clamped, never rejected. The operation is
/// idempotent: clamping an already clamped value returns it unchanged.
///
/// # Examples
///
/// ```
/// use gargantua::{clamp_parameters, RawParameters, SimulationConfig};
///
/// let config = SimulationConfig::default();
/// let params = clamp_parameters(RawParameters { mass: 0.0, distance: 1.0e12 }, &config);
/// assert_eq!(params.mass(), config.mass.min);
/// assert_eq!(params.distance(), config.distance.max);
/// ```
#[must_use]
pub fn clamp_parameters(raw: RawParameters, config: &SimulationConfig) -> SimulationParameters {
    SimulationParameters {
        mass: config.mass.clamp(raw.mass),
        distance: config.distance.clamp(raw.distance),
    }
}
