//! Uniform sampling primitives shared by the whole generator.
//!
//! Every random draw flows through a caller-supplied [`rand::Rng`], so a
//! seeded generator reproduces entire runs, names included.

use rand::Rng;
use serde::Deserialize;

use crate::error::{ForgeError, ForgeResult};

/// A `[min, max]` interval over `f64` with a uniform sampler.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draw uniformly from `[min, max)`. A degenerate interval
    /// (`min == max`) always yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.min + rng.gen::<f64>() * (self.max - self.min)
    }

    /// Check the interval is usable as a metric range: finite bounds,
    /// strictly positive, and ordered.
    pub fn validate(&self, name: &str) -> ForgeResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ForgeError::Config(format!(
                "{name}: bounds must be finite (got [{}, {}])",
                self.min, self.max
            )));
        }
        if self.min <= 0.0 {
            return Err(ForgeError::Config(format!(
                "{name}: min must be > 0 (got {})",
                self.min
            )));
        }
        if self.max < self.min {
            return Err(ForgeError::Config(format!(
                "{name}: max {} is below min {}",
                self.max, self.min
            )));
        }
        Ok(())
    }
}

/// An inclusive integer count interval (campaigns per run, adsets per
/// campaign, ads per adset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draw a count from `[min, max]`, both ends included.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        if self.min >= self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }

    pub fn validate(&self, name: &str) -> ForgeResult<()> {
        if self.min == 0 {
            return Err(ForgeError::Config(format!(
                "{name}: min must be >= 1 (got 0)"
            )));
        }
        if self.max < self.min {
            return Err(ForgeError::Config(format!(
                "{name}: max {} is below min {}",
                self.max, self.min
            )));
        }
        Ok(())
    }
}

/// Jitter windows applied to a metric range's bounds when clamping a raw
/// daily value. Both windows are re-drawn on every application, so the
/// corridor around the configured range is soft rather than a hard cut.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ClampBand {
    #[serde(default = "default_floor_jitter")]
    pub floor_jitter: Range,
    #[serde(default = "default_ceiling_jitter")]
    pub ceiling_jitter: Range,
}

fn default_floor_jitter() -> Range {
    Range::new(0.75, 1.25)
}
fn default_ceiling_jitter() -> Range {
    Range::new(0.95, 1.25)
}

impl Default for ClampBand {
    fn default() -> Self {
        Self {
            floor_jitter: default_floor_jitter(),
            ceiling_jitter: default_ceiling_jitter(),
        }
    }
}

impl ClampBand {
    /// Pull `value` into the jittered corridor around `range`. The ceiling
    /// window extends above 1.0, so outputs may land above `range.max`, and
    /// the two windows overlap, so the floor can exceed the ceiling for a
    /// single draw. The result is always strictly positive for a valid
    /// `range`.
    pub fn apply<R: Rng + ?Sized>(&self, value: f64, range: Range, rng: &mut R) -> f64 {
        let floor = range.min * self.floor_jitter.sample(rng);
        let ceiling = range.max * self.ceiling_jitter.sample(rng);
        floor.max(value.min(ceiling))
    }

    pub fn validate(&self) -> ForgeResult<()> {
        self.floor_jitter.validate("clamp.floor_jitter")?;
        self.ceiling_jitter.validate("clamp.ceiling_jitter")
    }
}

/// `Prefix_12345678` style entity name drawn from the run's RNG, so seeded
/// runs reproduce campaign, adset, and ad names.
pub fn entity_name<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    format!("{prefix}_{}", rng.gen_range(0..100_000_000u32))
}
