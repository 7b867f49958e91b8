//! Gravitational time dilation factor.
//!
//! The factor is the Schwarzschild ratio between a distant observer's
//! clock and a static clock at radius `r`:
//!
//! ```text
//! factor = 1 / sqrt(1 - 2GM / (r c²)) = 1 / sqrt(1 - r_s / r)
//! ```
//!
//! The computation is total. At or inside the horizon, and for any result
//! that is NaN, infinite or below 1, the configured fallback factor is
//! returned instead and the substitution is reported as a
//! [`FactorSource::Fallback`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::constants::{GRAVITATIONAL_CONSTANT, NO_DILATION_FACTOR, SPEED_OF_LIGHT};

/// A time dilation factor: always finite and at least 1.
///
/// # Examples
///
/// ```
/// use gargantua::DilationFactor;
///
/// assert!(DilationFactor::new(0.5).is_none());
/// assert!(DilationFactor::new(f64::NAN).is_none());
/// assert_eq!(DilationFactor::new(2.0).unwrap().value(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DilationFactor(f64);

impl DilationFactor {
    /// The "no dilation" factor.
    pub const ONE: Self = Self(NO_DILATION_FACTOR);

    /// Wraps `value` if it is finite and `>= 1`.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 1.0).then_some(Self(value))
    }

    /// The raw factor.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for DilationFactor {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<f64> for DilationFactor {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("dilation factor must be finite and >= 1, got {value}"))
    }
}

impl From<DilationFactor> for f64 {
    fn from(factor: DilationFactor) -> Self {
        factor.0
    }
}

impl fmt::Display for DilationFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}x", self.0)
    }
}

/// Why the fallback factor was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The orbit is at or inside the Schwarzschild radius.
    InsideHorizon,
    /// The formula produced NaN or an infinite value.
    NonFinite,
    /// The formula produced a value below 1.
    BelowUnity,
}

/// Where a factor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum FactorSource {
    /// Evaluated from the Schwarzschild metric.
    Computed,
    /// Replaced by the configured fallback.
    Fallback(FallbackReason),
}

impl FactorSource {
    /// Whether the fallback replaced the computed value.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// A factor together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DilationEvaluation {
    /// Factor applied to the dilated clock.
    pub factor: DilationFactor,
    /// Where the factor came from.
    pub source: FactorSource,
}

/// Schwarzschild radius `2GM/c²` of `mass`, expressed in the configured
/// distance unit.
#[must_use]
pub fn schwarzschild_radius(mass: f64, config: &SimulationConfig) -> f64 {
    let mass_kg = config.mass_unit.to_kilograms(mass);
    let radius_m = 2.0 * GRAVITATIONAL_CONSTANT * mass_kg / (SPEED_OF_LIGHT * SPEED_OF_LIGHT);
    config.distance_unit.from_meters(radius_m)
}

/// Evaluates the dilation factor and reports whether the fallback was used.
///
/// `mass` and `distance` are in the configured units. The horizon check
/// and the ratio `r_s / r` are both taken in those units so that a
/// distance equal to [`schwarzschild_radius`] is always classified as
/// inside the horizon.
#[must_use]
pub fn evaluate_dilation(mass: f64, distance: f64, config: &SimulationConfig) -> DilationEvaluation {
    let horizon = schwarzschild_radius(mass, config);

    // Written negated so NaN lands in the fallback branch too.
    if !(distance > horizon) {
        return fallback(config, FallbackReason::InsideHorizon);
    }

    let raw = 1.0 / (1.0 - horizon / distance).sqrt();
    if !raw.is_finite() {
        return fallback(config, FallbackReason::NonFinite);
    }
    match DilationFactor::new(raw) {
        Some(factor) => DilationEvaluation {
            factor,
            source: FactorSource::Computed,
        },
        None => fallback(config, FallbackReason::BelowUnity),
    }
}

/// Computes the dilation factor for `mass` at `distance`.
///
/// Never fails: degenerate inputs yield the configured fallback.
///
/// # Examples
///
/// ```
/// use gargantua::{compute_dilation_factor, SimulationConfig};
///
/// let config = SimulationConfig::default();
/// // One solar mass seen from 500,000 km: negligible dilation.
/// let factor = compute_dilation_factor(1.0, 500_000.0, &config);
/// assert!((factor.value() - 1.0).abs() < 1e-5);
/// ```
#[must_use]
pub fn compute_dilation_factor(mass: f64, distance: f64, config: &SimulationConfig) -> DilationFactor {
    evaluate_dilation(mass, distance, config).factor
}

fn fallback(config: &SimulationConfig, reason: FallbackReason) -> DilationEvaluation {
    tracing::debug!(?reason, fallback = config.fallback_factor(), "substituting fallback dilation factor");
    DilationEvaluation {
        // Both fallback policies are finite and >= 1.
        factor: DilationFactor::new(config.fallback_factor()).unwrap_or(DilationFactor::ONE),
        source: FactorSource::Fallback(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistanceUnit, FallbackPolicy, MassUnit};
    use crate::constants::{GARGANTUA_MASS_SOLAR, MOVIE_DILATION_FACTOR, SOLAR_MASS_KG};

    #[test]
    fn sun_horizon_is_about_three_kilometers() {
        let config = SimulationConfig::default();
        let r_s = schwarzschild_radius(1.0, &config);
        assert!((r_s - 2.953).abs() < 0.01, "r_s = {r_s}");
    }

    #[test]
    fn gargantua_near_horizon_factor_is_one_hundred() {
        let config = SimulationConfig::default();
        let r_s = schwarzschild_radius(GARGANTUA_MASS_SOLAR, &config);
        // 2GM/(rc²) = 0.9999
        let eval = evaluate_dilation(GARGANTUA_MASS_SOLAR, r_s / 0.9999, &config);
        assert_eq!(eval.source, FactorSource::Computed);
        assert!((eval.factor.value() - 100.0).abs() < 1e-3, "factor = {}", eval.factor.value());
    }

    #[test]
    fn solar_mass_far_away_is_negligible() {
        let config = SimulationConfig::default();
        let factor = compute_dilation_factor(1.0, 500_000.0, &config);
        assert!(factor.value() >= 1.0);
        assert!(factor.value() - 1.0 < 1e-5);
    }

    #[test]
    fn horizon_and_inside_use_fallback_exactly() {
        let config = SimulationConfig::default();
        let r_s = schwarzschild_radius(GARGANTUA_MASS_SOLAR, &config);
        for distance in [r_s, r_s * 0.5, 1.0, 0.0, -10.0] {
            let eval = evaluate_dilation(GARGANTUA_MASS_SOLAR, distance, &config);
            assert_eq!(eval.factor.value(), MOVIE_DILATION_FACTOR, "distance {distance}");
            assert_eq!(eval.source, FactorSource::Fallback(FallbackReason::InsideHorizon));
        }
    }

    #[test]
    fn no_dilation_policy_falls_back_to_one() {
        let config = SimulationConfig {
            fallback: FallbackPolicy::NoDilation,
            ..SimulationConfig::default()
        };
        let factor = compute_dilation_factor(GARGANTUA_MASS_SOLAR, 100.0, &config);
        assert_eq!(factor, DilationFactor::ONE);
    }

    #[test]
    fn nan_inputs_use_fallback() {
        let config = SimulationConfig::default();
        let eval = evaluate_dilation(f64::NAN, 1.0e9, &config);
        assert!(eval.source.is_fallback());
        assert_eq!(eval.factor.value(), MOVIE_DILATION_FACTOR);

        let eval = evaluate_dilation(GARGANTUA_MASS_SOLAR, f64::NAN, &config);
        assert!(eval.source.is_fallback());
    }

    #[test]
    fn negative_mass_falls_back_below_unity() {
        let config = SimulationConfig::default();
        let eval = evaluate_dilation(-GARGANTUA_MASS_SOLAR, 1.0e9, &config);
        assert_eq!(eval.source, FactorSource::Fallback(FallbackReason::BelowUnity));
    }

    #[test]
    fn kilogram_and_meter_units_agree_with_solar_and_kilometer() {
        let solar = SimulationConfig::default();
        let si = SimulationConfig {
            mass_unit: MassUnit::Kilograms,
            distance_unit: DistanceUnit::Meters,
            ..SimulationConfig::default()
        };
        let a = compute_dilation_factor(GARGANTUA_MASS_SOLAR, 6.0e8, &solar);
        let b = compute_dilation_factor(GARGANTUA_MASS_SOLAR * SOLAR_MASS_KG, 6.0e11, &si);
        assert!((a.value() - b.value()).abs() < 1e-9);
    }

    #[test]
    fn factor_grows_as_distance_shrinks() {
        let config = SimulationConfig::default();
        let r_s = schwarzschild_radius(GARGANTUA_MASS_SOLAR, &config);
        let mut previous = 1.0;
        for k in (1..=200).rev() {
            let distance = r_s * (1.0 + f64::from(k) * 0.05);
            let factor = compute_dilation_factor(GARGANTUA_MASS_SOLAR, distance, &config).value();
            assert!(factor >= previous, "non-monotone at distance {distance}");
            previous = factor;
        }
    }

    #[test]
    fn factor_grows_with_mass() {
        let config = SimulationConfig::default();
        let distance = config.distance.min;
        let mut previous = 1.0;
        for step in 1..=200 {
            let mass = f64::from(step) * 1.0e6;
            let factor = compute_dilation_factor(mass, distance, &config).value();
            assert!(factor >= previous, "non-monotone at mass {mass}");
            previous = factor;
        }
    }

    #[test]
    fn deserialize_rejects_invalid_factor() {
        let ok: DilationFactor = serde_json::from_str("2.5").unwrap();
        assert_eq!(ok.value(), 2.5);
        assert!(serde_json::from_str::<DilationFactor>("0.5").is_err());
    }

    #[test]
    fn display_rounds_to_whole_factor() {
        assert_eq!(DilationFactor::new(61_320.4).unwrap().to_string(), "61320x");
    }
}
