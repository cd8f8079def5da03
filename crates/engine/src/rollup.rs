//! Cross-ad aggregation: batch totals, ratio rollups, and the running
//! campaign averages.

use adforge_core::config::AverageMode;
use serde::{Deserialize, Serialize};

use crate::ad::AdBatch;

/// Plain sums over every ad's daily series within one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchTotals {
    pub impressions: f64,
    pub spend: f64,
    pub clicks: f64,
    pub purchases: f64,
    pub revenue: f64,
    pub adds_to_cart: f64,
}

impl BatchTotals {
    pub fn accumulate(&mut self, batch: &AdBatch) {
        self.impressions += batch.impressions.iter().sum::<f64>();
        self.spend += batch.spend.iter().sum::<f64>();
        self.clicks += batch.clicks.iter().sum::<f64>();
        self.purchases += batch.purchases.iter().sum::<f64>();
        self.revenue += batch.revenue.iter().sum::<f64>();
        self.adds_to_cart += batch.adds_to_cart.iter().sum::<f64>();
    }

    /// Ratio metrics for the batch as a whole. Totals must come from at
    /// least one simulated day, which validated configs guarantee; all
    /// denominators are then strictly positive.
    pub fn rollup(&self) -> BatchRollup {
        BatchRollup {
            cpm: self.spend / (self.impressions / 1000.0),
            ctr: self.clicks / self.impressions,
            cac: self.spend / self.purchases,
            aov: self.revenue / self.purchases,
            atc_rate: self.adds_to_cart / self.clicks,
        }
    }
}

/// One batch's ratio metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchRollup {
    pub cpm: f64,
    pub ctr: f64,
    pub cac: f64,
    pub aov: f64,
    pub atc_rate: f64,
}

/// Incremental means over successive batch rollups.
#[derive(Debug, Clone)]
pub struct RunningAverages {
    mode: AverageMode,
    batches: u32,
    days: u32,
    cpm: f64,
    ctr: f64,
    cac: f64,
    aov: f64,
    atc_rate: f64,
}

impl RunningAverages {
    pub fn new(mode: AverageMode) -> Self {
        Self {
            mode,
            batches: 0,
            days: 0,
            cpm: 0.0,
            ctr: 0.0,
            cac: 0.0,
            aov: 0.0,
            atc_rate: 0.0,
        }
    }

    /// Fold one batch's rollup into the averages. `batch_days` only
    /// matters in day-weighted mode.
    pub fn push(&mut self, rollup: &BatchRollup, batch_days: u32) {
        match self.mode {
            AverageMode::DayWeighted => {
                let prior = f64::from(self.days);
                let added = f64::from(batch_days);
                let total = prior + added;
                self.cpm = (self.cpm * prior + rollup.cpm * added) / total;
                self.ctr = (self.ctr * prior + rollup.ctr * added) / total;
                self.cac = (self.cac * prior + rollup.cac * added) / total;
                self.aov = (self.aov * prior + rollup.aov * added) / total;
                self.atc_rate = (self.atc_rate * prior + rollup.atc_rate * added) / total;
            }
            AverageMode::PerBatch => {
                let runs = f64::from(self.batches);
                self.cpm = (self.cpm * runs + rollup.cpm) / (runs + 1.0);
                self.ctr = (self.ctr * runs + rollup.ctr) / (runs + 1.0);
                self.cac = (self.cac * runs + rollup.cac) / (runs + 1.0);
                self.aov = (self.aov * runs + rollup.aov) / (runs + 1.0);
                self.atc_rate = (self.atc_rate * runs + rollup.atc_rate) / (runs + 1.0);
            }
        }
        self.batches += 1;
        self.days += batch_days;
    }

    pub fn summary(&self) -> SummaryMetrics {
        SummaryMetrics {
            cpm: self.cpm,
            ctr: self.ctr,
            cac: self.cac,
            aov: self.aov,
            atc_rate: self.atc_rate,
        }
    }
}

/// Campaign-level averages after the full run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub cpm: f64,
    pub ctr: f64,
    pub cac: f64,
    pub aov: f64,
    pub atc_rate: f64,
}
