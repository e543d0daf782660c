//! Fixed-point encoding of unit weights
//!
//! Weights travel over the wire as integer counts out of a fixed scale
//! (10,000 by default, four decimal digits). [`apportion`] is the only place a
//! continuous distribution is turned into counts; it guarantees the counts sum
//! to the scale exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;
use crate::weight::clamp_unit;

/// Default fixed-point scale: 10,000 units = 100%.
pub const DEFAULT_SCALE: u32 = 10_000;

/// Tolerance applied before flooring so that float noise such as
/// `3333.9999999997` floors to 3334 instead of 3333.
const SNAP_EPSILON: f64 = 1e-9;

/// Resolution at which fractional remainders are compared. Remainders closer
/// than this are ties and fall back to input order.
const REMAINDER_RESOLUTION: f64 = 1e9;

/// Integer denominator for fixed-point weights. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FixedPointScale(u32);

impl FixedPointScale {
    /// Create a scale, returning `None` for zero.
    pub const fn new(scale: u32) -> Option<Self> {
        if scale == 0 {
            None
        } else {
            Some(Self(scale))
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Smallest representable non-zero unit (`1 / scale`).
    pub fn min_unit(self) -> f64 {
        1.0 / self.as_f64()
    }

    /// Round a single unit weight to the nearest fixed-point count.
    ///
    /// Use [`apportion`] for a whole tier; independently rounded values are
    /// not guaranteed to sum to the scale.
    pub fn encode(self, unit: f64) -> u32 {
        // clamp_unit bounds the product to [0, scale]
        (clamp_unit(unit) * self.as_f64()).round() as u32
    }

    /// Convert a fixed-point count back to a unit weight.
    pub fn decode(self, fixed: u32) -> f64 {
        f64::from(fixed.min(self.0)) / self.as_f64()
    }

    /// Round a unit weight to the scale's granularity
    /// (four decimal places at the default scale).
    pub fn round_unit(self, unit: f64) -> f64 {
        self.decode(self.encode(unit))
    }
}

impl Default for FixedPointScale {
    fn default() -> Self {
        Self(DEFAULT_SCALE)
    }
}

impl TryFrom<u32> for FixedPointScale {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ConfigError::ZeroScale)
    }
}

impl From<FixedPointScale> for u32 {
    fn from(scale: FixedPointScale) -> Self {
        scale.0
    }
}

impl fmt::Display for FixedPointScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry's weight in fixed-point form, as sent to the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedWeight<I> {
    pub id: I,
    pub fixed: u32,
}

impl<I> FixedWeight<I> {
    pub fn new(id: I, fixed: u32) -> Self {
        Self { id, fixed }
    }
}

/// Split `scale` into integer counts proportional to `shares`.
///
/// `shares` are expected to be non-negative and sum to 1. Each share is
/// floored, then the missing units are handed out one at a time to the
/// largest fractional remainders, ties going to the earlier entry. The result
/// always sums to `scale` for non-empty input.
pub fn apportion(shares: &[f64], scale: FixedPointScale) -> Vec<u32> {
    if shares.is_empty() {
        return Vec::new();
    }

    let mut fixed = Vec::with_capacity(shares.len());
    let mut remainders = Vec::with_capacity(shares.len());

    for &share in shares {
        let scaled = clamp_unit(share) * scale.as_f64();
        let floor = (scaled + SNAP_EPSILON).floor();
        let fraction = (scaled - floor).max(0.0);
        fixed.push(floor as u32);
        remainders.push((fraction * REMAINDER_RESOLUTION).round() as u64);
    }

    let total = u64::from(scale.get());
    let assigned: u64 = fixed.iter().map(|&f| u64::from(f)).sum();

    if assigned < total {
        // Stable sort keeps input order among equal remainders.
        let mut order: Vec<usize> = (0..fixed.len()).collect();
        order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]));

        let mut deficit = total - assigned;
        for &i in order.iter().cycle() {
            if deficit == 0 {
                break;
            }
            fixed[i] += 1;
            deficit -= 1;
        }
    } else if assigned > total {
        // Only reachable when shares overshoot 1.
        let mut order: Vec<usize> = (0..fixed.len()).collect();
        order.sort_by_key(|&i| remainders[i]);

        let mut surplus = assigned - total;
        while surplus > 0 {
            let mut progressed = false;
            for &i in &order {
                if surplus == 0 {
                    break;
                }
                if fixed[i] > 0 {
                    fixed[i] -= 1;
                    surplus -= 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    tracing::trace!(entries = fixed.len(), scale = scale.get(), "apportioned weights");
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> FixedPointScale {
        FixedPointScale::default()
    }

    #[test]
    fn test_zero_scale_rejected() {
        assert!(FixedPointScale::new(0).is_none());
        assert_eq!(FixedPointScale::try_from(0), Err(ConfigError::ZeroScale));
        assert_eq!(FixedPointScale::new(100).map(FixedPointScale::get), Some(100));
    }

    #[test]
    fn test_scale_serde() {
        let parsed: FixedPointScale = serde_json::from_str("1000").unwrap();
        assert_eq!(parsed.get(), 1000);
        assert!(serde_json::from_str::<FixedPointScale>("0").is_err());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "1000");
    }

    #[test]
    fn test_encode_decode() {
        let s = scale();
        assert_eq!(s.encode(0.12346), 1235);
        assert_eq!(s.encode(1.7), 10_000);
        assert_eq!(s.encode(-0.2), 0);
        assert_eq!(s.encode(f64::NAN), 0);
        assert_eq!(s.decode(2500), 0.25);
        assert_eq!(s.decode(20_000), 1.0);
        assert_eq!(s.round_unit(0.33333), 0.3333);
        assert_eq!(s.min_unit(), 0.0001);
    }

    #[test]
    fn test_apportion_thirds() {
        let third = 1.0 / 3.0;
        assert_eq!(apportion(&[third, third, third], scale()), vec![3334, 3333, 3333]);
    }

    #[test]
    fn test_apportion_largest_remainder_wins() {
        // 0.12345 -> 1234.5, 0.33335 -> 3333.5, 0.5432 -> 5432.0
        let fixed = apportion(&[0.12345, 0.33335, 0.5432], scale());
        assert_eq!(fixed.iter().sum::<u32>(), 10_000);
        assert_eq!(fixed[2], 5432);
    }

    #[test]
    fn test_apportion_snaps_float_noise() {
        // 0.7 * 10_000 is 7000.000000000001 and 0.3 * 10_000 rounds just above 3000
        assert_eq!(apportion(&[0.7, 0.3], scale()), vec![7000, 3000]);
        let b = 0.5 * 0.3 / 0.8;
        let c = 0.5 * 0.5 / 0.8;
        assert_eq!(apportion(&[0.5, b, c], scale()), vec![5000, 1875, 3125]);
    }

    #[test]
    fn test_apportion_surplus_taken_back() {
        let fixed = apportion(&[0.6, 0.6], scale());
        assert_eq!(fixed.iter().sum::<u32>(), 10_000);
    }

    #[test]
    fn test_apportion_empty() {
        assert!(apportion(&[], scale()).is_empty());
    }

    #[test]
    fn test_apportion_small_scale() {
        let s = FixedPointScale::new(7).unwrap();
        let fixed = apportion(&[0.25, 0.25, 0.25, 0.25], s);
        assert_eq!(fixed, vec![2, 2, 2, 1]);
    }
}
