//! Simulation configuration.
//!
//! Everything the explorer treats as a product decision lives here: slider
//! bounds and steps, the units the sliders speak, the fallback factor and
//! the real-time tick interval. Configurations are plain serde records and
//! can be loaded from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    GARGANTUA_MASS_SOLAR, METERS_PER_KILOMETER, MOVIE_DILATION_FACTOR, NO_DILATION_FACTOR,
    SOLAR_MASS_KG,
};
use crate::error::{ConfigError, GargantuaResult, ValidationError};

/// Inclusive range, step and default of one slider.
///
/// # Examples
///
/// ```
/// use gargantua::ParameterBounds;
///
/// let bounds = ParameterBounds::new(10.0, 500.0, 10.0, 100.0);
/// assert_eq!(bounds.clamp(1_000.0), 500.0);
/// assert_eq!(bounds.quantize(104.0), 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
    /// Slider increment.
    pub step: f64,
    /// Value at session start.
    pub default: f64,
}

impl ParameterBounds {
    /// Builds bounds without validating them; see [`SimulationConfig::validate`].
    #[must_use]
    pub const fn new(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step,
            default,
        }
    }

    /// Clamps `value` into `[min, max]`.
    ///
    /// NaN maps to the (clamped) default. Never panics, even on an
    /// unvalidated range.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let value = if value.is_nan() { self.default } else { value };
        value.max(self.min).min(self.max)
    }

    /// Snaps `value` to the nearest step multiple above `min`, then clamps.
    #[must_use]
    pub fn quantize(&self, value: f64) -> f64 {
        if !(self.step.is_finite() && self.step > 0.0) || !value.is_finite() {
            return self.clamp(value);
        }
        let steps = ((value - self.min) / self.step).round();
        self.clamp(self.min + steps * self.step)
    }

    /// Returns true if `value` lies inside the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.min) || !positive(self.max) {
            return Err(ValidationError::NonPositiveBounds {
                field: field.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        if self.min > self.max {
            return Err(ValidationError::InvertedBounds {
                field: field.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        if !positive(self.step) {
            return Err(ValidationError::InvalidStep {
                field: field.to_string(),
                step: self.step,
            });
        }
        if !self.contains(self.default) {
            return Err(ValidationError::DefaultOutOfBounds {
                field: field.to_string(),
                value: self.default,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Unit the mass slider is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassUnit {
    /// Multiples of the Sun's mass (M☉).
    #[default]
    SolarMasses,
    /// SI kilograms.
    Kilograms,
}

impl MassUnit {
    /// Converts a mass in this unit to kilograms.
    #[must_use]
    pub fn to_kilograms(self, mass: f64) -> f64 {
        match self {
            Self::SolarMasses => mass * SOLAR_MASS_KG,
            Self::Kilograms => mass,
        }
    }

    /// Short label used in readouts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::SolarMasses => "M☉",
            Self::Kilograms => "kg",
        }
    }
}

/// Unit the distance slider is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Kilometers.
    #[default]
    Kilometers,
    /// SI meters.
    Meters,
}

impl DistanceUnit {
    /// Converts a distance in this unit to meters.
    #[must_use]
    pub fn to_meters(self, distance: f64) -> f64 {
        match self {
            Self::Kilometers => distance * METERS_PER_KILOMETER,
            Self::Meters => distance,
        }
    }

    /// Converts a distance in meters to this unit.
    #[must_use]
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            Self::Kilometers => meters / METERS_PER_KILOMETER,
            Self::Meters => meters,
        }
    }

    /// Short label used in readouts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Kilometers => "km",
            Self::Meters => "m",
        }
    }
}

/// Which factor replaces an undefined or degenerate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// The film's "1 hour = 7 years" ratio ([`MOVIE_DILATION_FACTOR`]).
    #[default]
    Dramatized,
    /// No dilation at all ([`NO_DILATION_FACTOR`]).
    NoDilation,
}

impl FallbackPolicy {
    /// The factor this policy substitutes.
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::Dramatized => MOVIE_DILATION_FACTOR,
            Self::NoDilation => NO_DILATION_FACTOR,
        }
    }
}

/// Full configuration of a simulation session.
///
/// The default distance range starts just outside the horizon of the
/// heaviest allowed black hole (2×10⁸ M☉, r_s ≈ 5.9×10⁸ km), so the
/// fallback is only reached by programmatic callers that bypass the sliders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Black-hole mass slider.
    pub mass: ParameterBounds,
    /// Orbital distance slider.
    pub distance: ParameterBounds,
    /// Unit of the mass slider.
    pub mass_unit: MassUnit,
    /// Unit of the distance slider.
    pub distance_unit: DistanceUnit,
    /// Factor used at or inside the horizon.
    pub fallback: FallbackPolicy,
    /// Real time between two clock ticks, in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mass: ParameterBounds::new(1.0e6, 2.0e8, 1.0e6, GARGANTUA_MASS_SOLAR),
            distance: ParameterBounds::new(6.0e8, 6.0e9, 1.0e7, 6.0e8),
            mass_unit: MassUnit::SolarMasses,
            distance_unit: DistanceUnit::Kilometers,
            fallback: FallbackPolicy::Dramatized,
            tick_interval_ms: 1_000,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a JSON configuration. Missing fields take
    /// their default values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and a
    /// `ValidationError` for inconsistent values.
    pub fn from_json_str(raw: &str) -> GargantuaResult<Self> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// errors of [`SimulationConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> GargantuaResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Serializes the configuration as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if serialization fails.
    pub fn to_json_pretty(&self) -> GargantuaResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ConfigError::Parse {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Checks bounds, steps, defaults and the tick interval.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.mass.validate("mass")?;
        self.distance.validate("distance")?;
        if self.tick_interval_ms == 0 {
            return Err(ValidationError::ZeroTickInterval);
        }
        Ok(())
    }

    /// Real time between two clock ticks.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Simulated seconds added to the reference clock per tick.
    #[must_use]
    pub fn tick_interval_secs(&self) -> f64 {
        self.tick_interval().as_secs_f64()
    }

    /// The factor selected by [`SimulationConfig::fallback`].
    #[must_use]
    pub const fn fallback_factor(&self) -> f64 {
        self.fallback.factor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.fallback_factor(), MOVIE_DILATION_FACTOR);
    }

    #[test]
    fn clamp_handles_out_of_range_and_nan() {
        let bounds = ParameterBounds::new(10.0, 500.0, 10.0, 100.0);
        assert_eq!(bounds.clamp(5.0), 10.0);
        assert_eq!(bounds.clamp(600.0), 500.0);
        assert_eq!(bounds.clamp(250.0), 250.0);
        assert_eq!(bounds.clamp(f64::NAN), 100.0);
        assert_eq!(bounds.clamp(f64::INFINITY), 500.0);
        assert_eq!(bounds.clamp(f64::NEG_INFINITY), 10.0);
    }

    #[test]
    fn quantize_snaps_to_step_grid() {
        let bounds = ParameterBounds::new(1.0e6, 2.0e8, 1.0e6, 1.0e8);
        assert_eq!(bounds.quantize(1.0e8 + 400_000.0), 1.0e8);
        assert_eq!(bounds.quantize(1.0e8 + 600_000.0), 1.01e8);
        assert_eq!(bounds.quantize(5.0e9), 2.0e8);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(MassUnit::SolarMasses.to_kilograms(2.0), 2.0 * SOLAR_MASS_KG);
        assert_eq!(MassUnit::Kilograms.to_kilograms(5.0), 5.0);
        assert_eq!(DistanceUnit::Kilometers.to_meters(3.0), 3_000.0);
        assert_eq!(DistanceUnit::Kilometers.from_meters(3_000.0), 3.0);
        assert_eq!(DistanceUnit::Meters.from_meters(7.0), 7.0);
    }

    #[test]
    fn validate_rejects_bad_bounds() {
        let mut config = SimulationConfig::default();
        config.mass = ParameterBounds::new(10.0, 1.0, 1.0, 5.0);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvertedBounds { .. })
        ));

        let mut config = SimulationConfig::default();
        config.distance.step = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidStep { .. })
        ));

        let mut config = SimulationConfig::default();
        config.distance.min = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NonPositiveBounds { .. })
        ));

        let mut config = SimulationConfig::default();
        config.mass.default = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::DefaultOutOfBounds { .. })
        ));

        let mut config = SimulationConfig::default();
        config.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ValidationError::ZeroTickInterval)));
    }

    #[test]
    fn json_partial_config_uses_defaults() {
        let config = SimulationConfig::from_json_str(
            r#"{ "fallback": "no_dilation", "tick_interval_ms": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.fallback, FallbackPolicy::NoDilation);
        assert_eq!(config.fallback_factor(), NO_DILATION_FACTOR);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.mass, SimulationConfig::default().mass);
    }

    #[test]
    fn json_errors_are_classified() {
        let err = SimulationConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.is_config());

        let err = SimulationConfig::from_json_str(r#"{ "tick_interval_ms": 0 }"#).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn json_roundtrip_preserves_units() {
        let mut config = SimulationConfig::default();
        config.mass_unit = MassUnit::Kilograms;
        config.distance_unit = DistanceUnit::Meters;
        config.mass = ParameterBounds::new(1.0e30, 1.0e39, 1.0e30, 2.0e38);
        config.distance = ParameterBounds::new(1.0e9, 1.0e13, 1.0e9, 1.0e12);
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"kilograms\""));
        let parsed = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SimulationConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, crate::GargantuaError::Config(ConfigError::Io { .. })));
    }
}
