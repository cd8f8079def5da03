use serde::Deserialize;

use crate::error::{ForgeError, ForgeResult};
use crate::sample::{ClampBand, CountRange, Range};

/// Upper bound on `days_in_campaign`; keeps campaign start dates inside
/// chrono's representable range of roughly ±262,000 years.
pub const MAX_DAYS_IN_CAMPAIGN: u32 = 36_500_000;

/// Root generator configuration. Loaded from environment variables with
/// the prefix `ADFORGE__`.
///
/// Metric ranges bound the per-ad baselines and the per-day clamp; count
/// ranges shape the campaign tree. All of it is validated up front so the
/// simulation itself never divides by zero or samples an inverted range.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Fixed RNG seed. Leave unset for entropy-seeded runs.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_campaigns_per_run")]
    pub campaigns_per_run: CountRange,
    #[serde(default = "default_days_in_campaign")]
    pub days_in_campaign: u32,
    #[serde(default = "default_adsets_per_campaign")]
    pub adsets_per_campaign: CountRange,
    #[serde(default = "default_ads_per_adset")]
    pub ads_per_adset: CountRange,
    #[serde(default = "default_spend")]
    pub spend: Range,
    #[serde(default = "default_cpm")]
    pub cpm: Range,
    #[serde(default = "default_ctr")]
    pub ctr: Range,
    #[serde(default = "default_cac")]
    pub cac: Range,
    #[serde(default = "default_atc_rate")]
    pub atc_rate: Range,
    #[serde(default = "default_aov")]
    pub aov: Range,
    #[serde(default)]
    pub simulation: SimulationTuning,
}

/// Knobs for the simulation itself rather than the campaign shape.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationTuning {
    /// Longest batch a campaign is simulated in; longer campaigns are split.
    #[serde(default = "default_max_batch_days")]
    pub max_batch_days: u32,
    /// Shortest trend phase. Batches shorter than this get no trend at all.
    #[serde(default = "default_min_trend_phase_days")]
    pub min_trend_phase_days: u32,
    /// Upper bound on the per-day trend deviation from 1.0.
    #[serde(default = "default_max_trend_strength")]
    pub max_trend_strength: f64,
    /// Probability that a winner ad's trend phase points up. Losers get the
    /// complement.
    #[serde(default = "default_winner_up_bias")]
    pub winner_up_bias: f64,
    /// Row cap for the per-campaign table sample.
    #[serde(default = "default_table_sample_rows")]
    pub table_sample_rows: usize,
    #[serde(default)]
    pub clamp: ClampBand,
    #[serde(default)]
    pub average_mode: AverageMode,
}

/// How per-batch rollups are folded into the campaign summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageMode {
    /// Weight each batch by its day count, so a short tail batch does not
    /// count as much as a full-length one.
    #[default]
    DayWeighted,
    /// Plain arithmetic mean across batches regardless of their length.
    PerBatch,
}

// Default functions
fn default_campaigns_per_run() -> CountRange {
    CountRange::new(1, 1)
}
fn default_days_in_campaign() -> u32 {
    30
}
fn default_adsets_per_campaign() -> CountRange {
    CountRange::new(2, 4)
}
fn default_ads_per_adset() -> CountRange {
    CountRange::new(2, 4)
}
fn default_spend() -> Range {
    Range::new(1000.0, 120_000.0)
}
fn default_cpm() -> Range {
    Range::new(9.0, 45.0)
}
fn default_ctr() -> Range {
    Range::new(0.004, 0.035)
}
fn default_cac() -> Range {
    Range::new(35.0, 150.0)
}
fn default_atc_rate() -> Range {
    Range::new(0.002, 0.25)
}
fn default_aov() -> Range {
    Range::new(40.0, 250.0)
}
fn default_max_batch_days() -> u32 {
    120
}
fn default_min_trend_phase_days() -> u32 {
    5
}
fn default_max_trend_strength() -> f64 {
    0.35
}
fn default_winner_up_bias() -> f64 {
    0.5625
}
fn default_table_sample_rows() -> usize {
    25
}

impl Default for SimulationTuning {
    fn default() -> Self {
        Self {
            max_batch_days: default_max_batch_days(),
            min_trend_phase_days: default_min_trend_phase_days(),
            max_trend_strength: default_max_trend_strength(),
            winner_up_bias: default_winner_up_bias(),
            table_sample_rows: default_table_sample_rows(),
            clamp: ClampBand::default(),
            average_mode: AverageMode::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            campaigns_per_run: default_campaigns_per_run(),
            days_in_campaign: default_days_in_campaign(),
            adsets_per_campaign: default_adsets_per_campaign(),
            ads_per_adset: default_ads_per_adset(),
            spend: default_spend(),
            cpm: default_cpm(),
            ctr: default_ctr(),
            cac: default_cac(),
            atc_rate: default_atc_rate(),
            aov: default_aov(),
            simulation: SimulationTuning::default(),
        }
    }
}

// ─── Validation ─────────────────────────────────────────────────────────

impl SimulationTuning {
    pub fn validate(&self) -> ForgeResult<()> {
        if self.max_batch_days == 0 {
            return Err(ForgeError::Config(
                "simulation.max_batch_days must be >= 1".to_string(),
            ));
        }
        if self.min_trend_phase_days == 0 {
            return Err(ForgeError::Config(
                "simulation.min_trend_phase_days must be >= 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.max_trend_strength) {
            return Err(ForgeError::Config(format!(
                "simulation.max_trend_strength must be in [0, 1) (got {})",
                self.max_trend_strength
            )));
        }
        if !(0.0..=1.0).contains(&self.winner_up_bias) {
            return Err(ForgeError::Config(format!(
                "simulation.winner_up_bias must be in [0, 1] (got {})",
                self.winner_up_bias
            )));
        }
        self.clamp.validate()
    }
}

impl GeneratorConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADFORGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Reject any configuration the simulation cannot run on. Called by the
    /// generator before campaigns are built, so downstream code can assume
    /// positive metric samples and non-empty campaign trees.
    pub fn validate(&self) -> ForgeResult<()> {
        if self.days_in_campaign == 0 {
            return Err(ForgeError::Config(
                "days_in_campaign must be >= 1".to_string(),
            ));
        }
        if self.days_in_campaign > MAX_DAYS_IN_CAMPAIGN {
            return Err(ForgeError::Config(format!(
                "days_in_campaign must be <= {MAX_DAYS_IN_CAMPAIGN} (got {})",
                self.days_in_campaign
            )));
        }
        self.campaigns_per_run.validate("campaigns_per_run")?;
        self.adsets_per_campaign.validate("adsets_per_campaign")?;
        self.ads_per_adset.validate("ads_per_adset")?;
        self.spend.validate("spend")?;
        self.cpm.validate("cpm")?;
        self.ctr.validate("ctr")?;
        self.cac.validate("cac")?;
        self.atc_rate.validate("atc_rate")?;
        self.aov.validate("aov")?;
        self.simulation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.days_in_campaign, 30);
        assert_eq!(config.campaigns_per_run, CountRange::new(1, 1));
        assert_eq!(config.adsets_per_campaign, CountRange::new(2, 4));
        assert_eq!(config.simulation.max_batch_days, 120);
        assert_eq!(config.simulation.min_trend_phase_days, 5);
        assert_eq!(config.simulation.table_sample_rows, 25);
        assert_eq!(config.simulation.average_mode, AverageMode::DayWeighted);
    }

    #[test]
    fn test_validate_rejects_zero_days() {
        let config = GeneratorConfig {
            days_in_campaign: 0,
            ..GeneratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("days_in_campaign"));
    }

    #[test]
    fn test_validate_bounds_the_day_count() {
        let config = GeneratorConfig {
            days_in_campaign: 200_000_000,
            ..GeneratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("days_in_campaign"));

        let config = GeneratorConfig {
            days_in_campaign: MAX_DAYS_IN_CAMPAIGN,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_metric_range() {
        let config = GeneratorConfig {
            ctr: Range::new(0.0, 0.035),
            ..GeneratorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ctr"));

        let config = GeneratorConfig {
            cpm: Range::new(45.0, 9.0),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_counts() {
        let config = GeneratorConfig {
            adsets_per_campaign: CountRange::new(0, 4),
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_tuning() {
        let mut config = GeneratorConfig::default();
        config.simulation.min_trend_phase_days = 0;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.simulation.max_trend_strength = 1.0;
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.simulation.winner_up_bias = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_overrides_and_defaults() {
        let config: GeneratorConfig = serde_json::from_str(
            r#"{
                "seed": 42,
                "days_in_campaign": 250,
                "spend": { "min": 500.0, "max": 500.0 },
                "simulation": { "average_mode": "per_batch" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.days_in_campaign, 250);
        assert_eq!(config.spend, Range::new(500.0, 500.0));
        assert_eq!(config.simulation.average_mode, AverageMode::PerBatch);
        assert_eq!(config.simulation.max_batch_days, 120);
        assert_eq!(config.cpm, default_cpm());
    }
}
