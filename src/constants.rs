//! Physical and presentation constants.
//!
//! SI values are used for the factor computation; unit conversion happens
//! at the boundary in [`crate::config`].

// ---------------------------------------------------------------------------
// Physical Constants (SI)
// ---------------------------------------------------------------------------

/// Speed of light (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Newtonian gravitational constant (m^3 kg^-1 s^-2).
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;

/// Solar mass (kg).
pub const SOLAR_MASS_KG: f64 = 1.988_47e30;

/// Meters per kilometer.
pub const METERS_PER_KILOMETER: f64 = 1_000.0;

// ---------------------------------------------------------------------------
// Gargantua / Miller's planet
// ---------------------------------------------------------------------------

/// Gargantua's mass in solar masses (~100 million).
pub const GARGANTUA_MASS_SOLAR: f64 = 1.0e8;

/// "1 hour on Miller's planet = 7 years on Earth": 7 * 365 * 24 hours.
pub const MOVIE_DILATION_FACTOR: f64 = 61_320.0;

/// Baseline factor meaning "no dilation".
pub const NO_DILATION_FACTOR: f64 = 1.0;

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Seconds in a minute.
pub const SECONDS_PER_MINUTE: u64 = 60;
/// Seconds in an hour.
pub const SECONDS_PER_HOUR: u64 = 3_600;

/// Hours in a (non-leap) year.
pub const HOURS_PER_YEAR: f64 = 8_760.0;

/// Months in a year.
pub const MONTHS_PER_YEAR: f64 = 12.0;

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Rotation applied to the reference body every frame (radians).
pub const BASE_ROTATION_SPEED: f64 = 0.002;
