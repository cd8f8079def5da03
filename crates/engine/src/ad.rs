//! Ad — the leaf unit of the campaign tree and the place where daily
//! metrics are actually synthesized.

use adforge_core::config::{GeneratorConfig, SimulationTuning};
use adforge_core::sample::{entity_name, Range};
use rand::Rng;

use crate::trend::{self, TrendProfile};

/// Daily fluctuation drawn per metric per day; the resulting multiplier
/// spans `[0.5, 2.5)`.
const FLUCTUATION: Range = Range::new(-0.5, 1.5);

/// Baseline metric levels sampled once at construction. Every daily value
/// is a perturbation of these, so an ad keeps a recognizable character
/// across its whole life.
#[derive(Debug, Clone, Copy)]
pub struct Baselines {
    pub cpm: f64,
    pub ctr: f64,
    pub cac: f64,
    pub spend: f64,
    pub aov: f64,
    pub atc_rate: f64,
}

/// The configured ranges the baselines were drawn from, kept so the daily
/// clamp can anchor to them.
#[derive(Debug, Clone, Copy)]
struct MetricRanges {
    cpm: Range,
    ctr: Range,
    cac: Range,
    spend: Range,
    aov: Range,
    atc_rate: Range,
}

#[derive(Debug, Clone)]
pub struct Ad {
    pub name: String,
    pub campaign_name: String,
    pub adset_name: String,
    baselines: Baselines,
    ranges: MetricRanges,
}

impl Ad {
    pub fn new<R: Rng + ?Sized>(
        campaign_name: &str,
        adset_name: &str,
        config: &GeneratorConfig,
        rng: &mut R,
    ) -> Self {
        let name = entity_name("Ad", rng);
        let baselines = Baselines {
            cpm: config.cpm.sample(rng),
            ctr: config.ctr.sample(rng),
            cac: config.cac.sample(rng),
            spend: config.spend.sample(rng),
            aov: config.aov.sample(rng),
            atc_rate: config.atc_rate.sample(rng),
        };
        let ranges = MetricRanges {
            cpm: config.cpm,
            ctr: config.ctr,
            cac: config.cac,
            spend: config.spend,
            aov: config.aov,
            atc_rate: config.atc_rate,
        };
        Self {
            name,
            campaign_name: campaign_name.to_string(),
            adset_name: adset_name.to_string(),
            baselines,
            ranges,
        }
    }

    pub fn baselines(&self) -> &Baselines {
        &self.baselines
    }

    /// Simulate one batch of `days` days.
    ///
    /// Two fresh trend profiles are generated per call: one driving the
    /// cost side (cpm, ctr, spend) and one driving the conversion side
    /// (cac, atc rate, aov). Nothing carries over between batches, so every
    /// call starts from the same baselines.
    pub fn run_batch<R: Rng + ?Sized>(
        &self,
        days: u32,
        tuning: &SimulationTuning,
        rng: &mut R,
    ) -> AdBatch {
        let cpm_trend = trend::generate(days, tuning, rng);
        let atc_trend = trend::generate(days, tuning, rng);

        let mut batch = AdBatch::with_days(days);
        for day in 0..days as usize {
            let sample = DaySample {
                cpm: self.daily_value(self.baselines.cpm, self.ranges.cpm, &cpm_trend, day, tuning, rng),
                ctr: self.daily_value(self.baselines.ctr, self.ranges.ctr, &cpm_trend, day, tuning, rng),
                spend: self.daily_value(self.baselines.spend, self.ranges.spend, &cpm_trend, day, tuning, rng),
                cac: self.daily_value(self.baselines.cac, self.ranges.cac, &atc_trend, day, tuning, rng),
                atc_rate: self.daily_value(self.baselines.atc_rate, self.ranges.atc_rate, &atc_trend, day, tuning, rng),
                aov: self.daily_value(self.baselines.aov, self.ranges.aov, &atc_trend, day, tuning, rng),
            };
            batch.push(sample.derive());
        }
        batch
    }

    fn daily_value<R: Rng + ?Sized>(
        &self,
        baseline: f64,
        range: Range,
        trend: &TrendProfile,
        day: usize,
        tuning: &SimulationTuning,
        rng: &mut R,
    ) -> f64 {
        let fluctuation = FLUCTUATION.sample(rng);
        let raw = baseline * trend.factor(day) * (1.0 + fluctuation);
        tuning.clamp.apply(raw, range, rng)
    }
}

/// One day's sampled metric levels, before funnel derivation.
#[derive(Debug, Clone, Copy)]
struct DaySample {
    cpm: f64,
    ctr: f64,
    spend: f64,
    cac: f64,
    atc_rate: f64,
    aov: f64,
}

impl DaySample {
    /// The funnel derivations every day of every batch goes through.
    fn derive(&self) -> DayResult {
        let impressions = self.spend / self.cpm * 1000.0;
        let clicks = impressions * self.ctr;
        let adds_to_cart = clicks * self.atc_rate;
        let purchases = self.spend / self.cac;
        let revenue = purchases * self.aov;
        DayResult {
            spend: self.spend,
            cpm: self.cpm,
            impressions,
            clicks,
            adds_to_cart,
            purchases,
            revenue,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DayResult {
    spend: f64,
    cpm: f64,
    impressions: f64,
    clicks: f64,
    adds_to_cart: f64,
    purchases: f64,
    revenue: f64,
}

/// One batch's daily output series for a single ad. Every series holds
/// exactly `days` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct AdBatch {
    pub days: u32,
    pub spend: Vec<f64>,
    pub impressions: Vec<f64>,
    pub cpm: Vec<f64>,
    pub clicks: Vec<f64>,
    pub adds_to_cart: Vec<f64>,
    pub purchases: Vec<f64>,
    pub revenue: Vec<f64>,
}

impl AdBatch {
    fn with_days(days: u32) -> Self {
        let cap = days as usize;
        Self {
            days,
            spend: Vec::with_capacity(cap),
            impressions: Vec::with_capacity(cap),
            cpm: Vec::with_capacity(cap),
            clicks: Vec::with_capacity(cap),
            adds_to_cart: Vec::with_capacity(cap),
            purchases: Vec::with_capacity(cap),
            revenue: Vec::with_capacity(cap),
        }
    }

    fn push(&mut self, day: DayResult) {
        self.spend.push(day.spend);
        self.impressions.push(day.impressions);
        self.cpm.push(day.cpm);
        self.clicks.push(day.clicks);
        self.adds_to_cart.push(day.adds_to_cart);
        self.purchases.push(day.purchases);
        self.revenue.push(day.revenue);
    }
}
