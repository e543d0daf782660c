//! Weight entries and raw weight inputs

use serde::{Deserialize, Serialize};

/// Default tolerance for the fraction-vs-percentage heuristic.
pub const DEFAULT_PERCENT_EPSILON: f64 = 1e-6;

/// One endpoint's share of a tier, keyed by the endpoint-in-tier association id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry<I> {
    pub id: I,
    /// Fractional share in `[0, 1]`
    pub unit: f64,
}

impl<I> WeightEntry<I> {
    pub fn new(id: I, unit: f64) -> Self {
        Self { id, unit }
    }
}

/// Clamp a unit weight into `[0, 1]`. NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Representation a raw weight was expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScale {
    /// `0..=1`
    Fraction,
    /// `0..=100`
    Percent,
}

/// A weight as received from a legacy or external source.
///
/// Tagged values convert directly. Untagged values go through
/// [`infer_unit`], which cannot tell `1.5` the fraction from `1.5` the
/// percentage; tag inputs whenever the source knows its own units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawWeight {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<WeightScale>,
}

impl RawWeight {
    pub fn fraction(value: f64) -> Self {
        Self {
            value,
            scale: Some(WeightScale::Fraction),
        }
    }

    pub fn percent(value: f64) -> Self {
        Self {
            value,
            scale: Some(WeightScale::Percent),
        }
    }

    pub fn untagged(value: f64) -> Self {
        Self { value, scale: None }
    }

    /// Convert to a clamped unit weight.
    pub fn to_unit(self, percent_epsilon: f64) -> f64 {
        match self.scale {
            Some(WeightScale::Fraction) => clamp_unit(self.value),
            Some(WeightScale::Percent) => clamp_unit(self.value / 100.0),
            None => infer_unit(self.value, percent_epsilon),
        }
    }
}

/// Input record pairing an id with a raw weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWeightEntry<I> {
    pub id: I,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<WeightScale>,
}

impl<I> RawWeightEntry<I> {
    pub fn raw(&self) -> RawWeight {
        RawWeight {
            value: self.weight,
            scale: self.scale,
        }
    }
}

/// Treat values above `1 + epsilon` as percentages, everything else as a
/// fraction, and clamp the result.
pub fn infer_unit(raw: f64, epsilon: f64) -> f64 {
    if raw > 1.0 + epsilon {
        clamp_unit(raw / 100.0)
    } else {
        clamp_unit(raw)
    }
}
