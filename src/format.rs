//! Display formatting for clock readouts.
//!
//! Pure projections of raw seconds into the strings shown next to the two
//! planets. Nothing above this layer needs raw seconds.

use serde::Serialize;

use crate::clock::ClockPair;
use crate::constants::{HOURS_PER_YEAR, MONTHS_PER_YEAR, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use crate::dilation::DilationFactor;

/// Formats `seconds` as `HH:MM:SS`.
///
/// Hours are zero-padded to two digits and keep growing past 99.
/// Fractional seconds are truncated; negative or non-finite input reads as
/// zero.
///
/// # Examples
///
/// ```
/// use gargantua::format::format_hms;
///
/// assert_eq!(format_hms(3_725.9), "01:02:05");
/// assert_eq!(format_hms(61_320.0 * 3_600.0), "61320:00:00");
/// ```
#[must_use]
pub fn format_hms(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let secs = total % SECONDS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats a span of `hours` in years, or in months below one year.
///
/// # Examples
///
/// ```
/// use gargantua::format::format_span;
///
/// assert_eq!(format_span(61_320.0), "7.0 years");
/// assert_eq!(format_span(730.0), "1.0 months");
/// ```
#[must_use]
pub fn format_span(hours: f64) -> String {
    let years = hours / HOURS_PER_YEAR;
    if years < 1.0 {
        format!("{:.1} months", years * MONTHS_PER_YEAR)
    } else {
        format!("{years:.1} years")
    }
}

/// Formats a clock value given in seconds with [`format_span`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_span_secs(seconds: f64) -> String {
    format_span(seconds / SECONDS_PER_HOUR as f64)
}

/// Groups the integer part of `value` in thousands: `100000000` becomes
/// `100,000,000`.
#[must_use]
pub fn format_grouped(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One-line comparison of the two clock rates.
///
/// ```
/// use gargantua::{format::dilation_summary, DilationFactor};
///
/// let summary = dilation_summary(DilationFactor::new(61_320.0).unwrap());
/// assert_eq!(summary, "1 hour on Miller's Planet = 61320 hours on Earth (approximately 7.0 years on Earth)");
/// ```
#[must_use]
pub fn dilation_summary(factor: DilationFactor) -> String {
    format!(
        "1 hour on Miller's Planet = {:.0} hours on Earth (approximately {} on Earth)",
        factor.value().round(),
        format_span(factor.value())
    )
}

/// Formatted readout of one clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockReadout {
    /// `HH:MM:SS`.
    pub clock: String,
    /// Span in months or years.
    pub span: String,
}

impl ClockReadout {
    /// Readout of a clock value in seconds.
    #[must_use]
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            clock: format_hms(seconds),
            span: format_span_secs(seconds),
        }
    }
}

/// Formatted readouts of both clocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeReadout {
    /// Earth (reference clock).
    pub reference: ClockReadout,
    /// Miller's planet (dilated clock).
    pub dilated: ClockReadout,
}

impl TimeReadout {
    /// Readouts of both clocks of a pair.
    #[must_use]
    pub fn new(clocks: &ClockPair) -> Self {
        Self {
            reference: ClockReadout::from_seconds(clocks.reference_time()),
            dilated: ClockReadout::from_seconds(clocks.dilated_time()),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hms_pads_and_truncates() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(59.99), "00:00:59");
        assert_eq!(format_hms(60.0), "00:01:00");
        assert_eq!(format_hms(3_599.0), "00:59:59");
        assert_eq!(format_hms(86_400.0), "24:00:00");
        assert_eq!(format_hms(360_000.0), "100:00:00");
    }

    #[test]
    fn hms_rejects_garbage() {
        assert_eq!(format_hms(-5.0), "00:00:00");
        assert_eq!(format_hms(f64::NAN), "00:00:00");
        assert_eq!(format_hms(f64::INFINITY), "00:00:00");
    }

    #[test]
    fn span_switches_units_at_one_year() {
        assert_eq!(format_span(0.0), "0.0 months");
        assert_eq!(format_span(4_380.0), "6.0 months");
        assert_eq!(format_span(8_760.0), "1.0 years");
        assert_eq!(format_span(17_520.0), "2.0 years");
    }

    #[test]
    fn span_from_seconds() {
        assert_eq!(format_span_secs(8_760.0 * 3_600.0), "1.0 years");
    }

    #[test]
    fn grouped_numbers() {
        assert_eq!(format_grouped(0.0), "0");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(1_000.0), "1,000");
        assert_eq!(format_grouped(100_000_000.0), "100,000,000");
        assert_eq!(format_grouped(-1_234_567.0), "-1,234,567");
    }

    #[test]
    fn readout_projects_both_clocks() {
        let mut clocks = ClockPair::default();
        clocks.advance(7_200.0, DilationFactor::new(2.0).unwrap());
        let readout = TimeReadout::new(&clocks);
        assert_eq!(readout.reference.clock, "02:00:00");
        assert_eq!(readout.dilated.clock, "01:00:00");
        assert_eq!(readout.dilated.span, "0.0 months");
    }
}
