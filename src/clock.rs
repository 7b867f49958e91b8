//! Reference and dilated clocks.

use serde::{Deserialize, Serialize};

use crate::dilation::DilationFactor;

/// Two parallel clocks: a distant observer's (reference) and one near the
/// mass (dilated).
///
/// Both only ever grow. The dilated clock advances at `1 / factor` of the
/// reference rate, using whatever factor is current at each tick; earlier
/// ticks are never recomputed.
///
/// # Examples
///
/// ```
/// use gargantua::{ClockPair, DilationFactor};
///
/// let mut clocks = ClockPair::default();
/// clocks.advance(1.0, DilationFactor::new(4.0).unwrap());
/// assert_eq!(clocks.reference_time(), 1.0);
/// assert_eq!(clocks.dilated_time(), 0.25);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockPair {
    reference_time: f64,
    dilated_time: f64,
}

impl ClockPair {
    pub(crate) const fn at(reference_time: f64, dilated_time: f64) -> Self {
        Self {
            reference_time,
            dilated_time,
        }
    }

    /// Elapsed reference (far observer) time, in seconds.
    #[must_use]
    pub const fn reference_time(&self) -> f64 {
        self.reference_time
    }

    /// Elapsed dilated (near observer) time, in seconds.
    #[must_use]
    pub const fn dilated_time(&self) -> f64 {
        self.dilated_time
    }

    /// Advances both clocks by one tick of `interval` reference seconds.
    ///
    /// Non-finite or negative intervals are ignored so the clocks stay
    /// monotonic.
    pub fn advance(&mut self, interval: f64, factor: DilationFactor) {
        if !(interval.is_finite() && interval >= 0.0) {
            return;
        }
        self.reference_time += interval;
        self.dilated_time += interval / factor.value();
    }

    /// Reference-to-dilated ratio observed so far, if any dilated time has
    /// elapsed.
    #[must_use]
    pub fn observed_ratio(&self) -> Option<f64> {
        (self.dilated_time > 0.0).then(|| self.reference_time / self.dilated_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MOVIE_DILATION_FACTOR;

    fn factor(value: f64) -> DilationFactor {
        DilationFactor::new(value).unwrap()
    }

    #[test]
    fn n_ticks_with_constant_factor() {
        let mut clocks = ClockPair::default();
        let f = factor(3.0);
        for _ in 0..90 {
            clocks.advance(1.0, f);
        }
        assert_eq!(clocks.reference_time(), 90.0);
        assert!((clocks.dilated_time() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn movie_factor_one_dilated_second() {
        let mut clocks = ClockPair::default();
        let f = factor(MOVIE_DILATION_FACTOR);
        for _ in 0..61_320 {
            clocks.advance(1.0, f);
        }
        assert_eq!(clocks.reference_time(), 61_320.0);
        assert!((clocks.dilated_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn factor_change_is_not_retroactive() {
        let mut clocks = ClockPair::default();
        for _ in 0..10 {
            clocks.advance(1.0, factor(2.0));
        }
        let before = clocks.dilated_time();
        assert!((before - 5.0).abs() < 1e-12);

        clocks.advance(1.0, factor(10.0));
        assert!((clocks.dilated_time() - (before + 0.1)).abs() < 1e-12);
        assert_eq!(clocks.reference_time(), 11.0);
    }

    #[test]
    fn invalid_intervals_are_ignored() {
        let mut clocks = ClockPair::default();
        clocks.advance(-1.0, DilationFactor::ONE);
        clocks.advance(f64::NAN, DilationFactor::ONE);
        clocks.advance(f64::INFINITY, DilationFactor::ONE);
        assert_eq!(clocks, ClockPair::default());
    }

    #[test]
    fn observed_ratio_tracks_factor() {
        let mut clocks = ClockPair::default();
        assert_eq!(clocks.observed_ratio(), None);
        clocks.advance(2.0, factor(8.0));
        assert!((clocks.observed_ratio().unwrap() - 8.0).abs() < 1e-12);
    }
}
