//! Trend-phase generation.
//!
//! A batch's daily factors are built from a handful of multi-day phases
//! rather than independent per-day noise, so a metric drifts in one
//! direction for a sustained stretch before turning. Phase direction is a
//! biased coin: one flip per profile decides whether the series leans like
//! a winner or a loser, then each phase draws its direction against that
//! bias.

use adforge_core::config::SimulationTuning;
use adforge_core::sample::Range;
use rand::Rng;

/// Per-day multiplicative factors for one batch.
///
/// A profile may be empty when the phase draw lands on zero; an empty
/// profile reads as a flat `1.0` for every day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendProfile {
    factors: Vec<f64>,
}

impl TrendProfile {
    /// Factor for `day`, `1.0` past the end of the generated phases.
    pub fn factor(&self, day: usize) -> f64 {
        self.factors.get(day).copied().unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Generate a fresh profile for a batch of `days` days. `tuning` must have
/// passed validation.
///
/// Phases partition the batch exactly: the number of phases is drawn from
/// `[0, days / min_trend_phase_days)`, each phase reserves room for the
/// minimum length of every phase still to come, and the final phase absorbs
/// whatever remains. Non-empty profiles therefore always cover `days` days.
pub fn generate<R: Rng + ?Sized>(
    days: u32,
    tuning: &SimulationTuning,
    rng: &mut R,
) -> TrendProfile {
    let min_days = tuning.min_trend_phase_days;
    let max_phases = days / min_days;
    let num_phases = Range::new(0.0, f64::from(max_phases)).sample(rng).floor() as u32;
    let winner = rng.gen_bool(0.5);
    let up_bias = if winner {
        tuning.winner_up_bias
    } else {
        1.0 - tuning.winner_up_bias
    };

    let mut factors = Vec::with_capacity(days as usize);
    let mut days_available = days;
    for i in 0..num_phases {
        let reserved = (num_phases - i) * min_days;
        let longest = days_available - reserved;
        let mut phase_len = Range::new(f64::from(min_days), f64::from(longest))
            .sample(rng)
            .floor() as u32;
        if i == num_phases - 1 {
            phase_len = days_available;
        }
        days_available -= phase_len;

        let up = rng.gen_bool(up_bias);
        for _ in 0..phase_len {
            let strength = Range::new(0.0, tuning.max_trend_strength).sample(rng);
            factors.push(if up { 1.0 + strength } else { 1.0 - strength });
        }
    }

    TrendProfile { factors }
}
