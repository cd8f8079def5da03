//! Campaign — the aggregate root. Owns the adset/ad tree, splits the
//! simulated period into capped batches, and folds per-batch results into
//! a single immutable report.

use adforge_core::config::{GeneratorConfig, SimulationTuning};
use adforge_core::error::{ForgeError, ForgeResult};
use adforge_core::format;
use adforge_core::sample::entity_name;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use crate::ad::{Ad, AdBatch};
use crate::rollup::{BatchTotals, RunningAverages, SummaryMetrics};
use crate::table::{self, TableData, TableSampler};

/// Header row shared by every generated CSV file.
pub const CSV_COLUMNS: &str =
    "Date,Ad name,Spend,Impressions,Clicks,Adds to cart,Revenue,Purchases,Campaign,Adset";

pub fn csv_header() -> String {
    format!("{CSV_COLUMNS}\r\n")
}

/// Split `days` into batch lengths of at most `cap` days; the final batch
/// absorbs the remainder. `cap` must be >= 1.
pub(crate) fn batch_plan(days: u32, cap: u32) -> Vec<u32> {
    (0..days.div_ceil(cap))
        .map(|i| cap.min(days - cap * i))
        .collect()
}

/// A named grouping of ads. Carries no metrics of its own; all numbers
/// live on the ads.
#[derive(Debug, Clone)]
pub struct Adset {
    pub name: String,
    pub ads: Vec<Ad>,
}

#[derive(Debug, Clone)]
pub struct Campaign {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub days_in_campaign: u32,
    pub adsets: Vec<Adset>,
    /// Tuning snapshot taken at construction, after the config validates.
    simulation: SimulationTuning,
}

impl Campaign {
    /// Build a campaign tree ending now. Adset and ad counts are drawn from
    /// the configured ranges; every entity name comes from `rng`.
    pub fn new<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> ForgeResult<Self> {
        Self::new_ending_at(Utc::now(), config, rng)
    }

    /// Like [`Campaign::new`] with an explicit end timestamp, so runs can be
    /// pinned in time.
    pub fn new_ending_at<R: Rng + ?Sized>(
        end_date: DateTime<Utc>,
        config: &GeneratorConfig,
        rng: &mut R,
    ) -> ForgeResult<Self> {
        config.validate()?;

        let name = entity_name("Campaign", rng);
        let days = config.days_in_campaign;
        let start_date = end_date
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                ForgeError::Config(format!(
                    "days_in_campaign {days} puts the campaign start outside the supported date range"
                ))
            })?;

        let adsets = (0..config.adsets_per_campaign.sample(rng))
            .map(|_| {
                let adset_name = entity_name("Adset", rng);
                let ads = (0..config.ads_per_adset.sample(rng))
                    .map(|_| Ad::new(&name, &adset_name, config, rng))
                    .collect();
                Adset {
                    name: adset_name,
                    ads,
                }
            })
            .collect();

        Ok(Self {
            name,
            start_date,
            end_date,
            days_in_campaign: days,
            adsets,
            simulation: config.simulation.clone(),
        })
    }

    /// Ads across all adsets, in creation order.
    pub fn ads(&self) -> impl Iterator<Item = &Ad> {
        self.adsets.iter().flat_map(|adset| adset.ads.iter())
    }

    pub fn num_ads(&self) -> usize {
        self.adsets.iter().map(|adset| adset.ads.len()).sum()
    }

    /// Run the full batched simulation and produce this campaign's report.
    ///
    /// The period is simulated in batches of at most `max_batch_days` days,
    /// per the tuning captured at construction. Each batch simulates every
    /// ad with fresh trends, then its rollup is folded into the running
    /// averages and its rows are appended to the CSV body and offered to
    /// the table sampler. Repeated calls yield independently drawn reports.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> CampaignReport {
        let tuning = &self.simulation;
        let ads: Vec<&Ad> = self.ads().collect();
        let cap = self.days_in_campaign.min(tuning.max_batch_days);
        let plan = batch_plan(self.days_in_campaign, cap);

        let mut averages = RunningAverages::new(tuning.average_mode);
        let mut sampler = TableSampler::new(tuning.table_sample_rows);
        let mut csv = String::new();

        for (i, &batch_days) in plan.iter().enumerate() {
            let batch_start = self.start_date + Duration::days(i64::from(i as u32 * cap));

            let results: Vec<AdBatch> = ads
                .iter()
                .map(|ad| ad.run_batch(batch_days, tuning, rng))
                .collect();

            let mut totals = BatchTotals::default();
            for batch in &results {
                totals.accumulate(batch);
            }
            averages.push(&totals.rollup(), batch_days);

            append_batch_csv(&mut csv, batch_start, &ads, &results);
            sampler.offer(batch_start, &ads, &results, batch_days);

            debug!(
                campaign = %self.name,
                batch = i,
                days = batch_days,
                "batch simulated"
            );
        }

        CampaignReport {
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            metrics: averages.summary(),
            table: sampler.finish(),
            csv,
        }
    }
}

/// Append one batch's rows, ad-major: all of the first ad's days, then the
/// next ad's. Row order inside the blob differs from the table sample on
/// purpose; consumers sort on the date column.
fn append_batch_csv(csv: &mut String, batch_start: DateTime<Utc>, ads: &[&Ad], results: &[AdBatch]) {
    for (ad, batch) in ads.iter().zip(results) {
        for day in 0..batch.days as usize {
            let date = batch_start + Duration::days(day as i64);
            let row = table::format_row(date, ad, batch, day);
            csv.push_str(&format::csv_line([
                row.date,
                row.ad,
                row.spend.to_string(),
                row.impressions.to_string(),
                row.clicks.to_string(),
                row.adds_to_cart.to_string(),
                row.revenue.to_string(),
                row.purchases.to_string(),
                row.campaign,
                row.adset,
            ]));
        }
    }
}

/// Everything one campaign run produces. Immutable once returned; running
/// the campaign again yields a brand-new report.
#[derive(Debug, Clone)]
pub struct CampaignReport {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub metrics: SummaryMetrics,
    pub table: TableData,
    pub csv: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_core::sample::CountRange;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn small_config(days: u32) -> GeneratorConfig {
        GeneratorConfig {
            days_in_campaign: days,
            adsets_per_campaign: CountRange::new(1, 1),
            ads_per_adset: CountRange::new(1, 1),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_batch_plan_partitions_exactly() {
        for (days, cap) in [(1, 120), (119, 120), (120, 120), (121, 120), (250, 120), (360, 120), (30, 7)] {
            let plan = batch_plan(days, cap);
            assert_eq!(plan.iter().sum::<u32>(), days, "days {days} cap {cap}");
            assert!(plan.iter().all(|&b| b >= 1 && b <= cap));
            assert_eq!(plan.len() as u32, days.div_ceil(cap));
        }
        assert_eq!(batch_plan(250, 120), vec![120, 120, 10]);
        assert_eq!(batch_plan(120, 120), vec![120]);
    }

    #[test]
    fn test_tree_honors_count_ranges() {
        let config = GeneratorConfig::default();
        let mut rng = StdRng::seed_from_u64(21);
        let campaign = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap();

        assert!(campaign.name.starts_with("Campaign_"));
        let adsets = campaign.adsets.len() as u32;
        assert!((2..=4).contains(&adsets));
        for adset in &campaign.adsets {
            assert!(adset.name.starts_with("Adset_"));
            let ads = adset.ads.len() as u32;
            assert!((2..=4).contains(&ads));
            for ad in &adset.ads {
                assert_eq!(ad.campaign_name, campaign.name);
                assert_eq!(ad.adset_name, adset.name);
            }
        }
        assert_eq!(campaign.num_ads(), campaign.ads().count());
    }

    #[test]
    fn test_campaign_dates_span_the_period() {
        let config = small_config(30);
        let mut rng = StdRng::seed_from_u64(23);
        let campaign = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap();
        assert_eq!(campaign.end_date, fixed_end());
        assert_eq!(campaign.end_date - campaign.start_date, Duration::days(30));
    }

    #[test]
    fn test_invalid_config_is_rejected_at_construction() {
        let config = GeneratorConfig {
            days_in_campaign: 0,
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Campaign::new_ending_at(fixed_end(), &config, &mut rng).is_err());
    }

    #[test]
    fn test_start_dates_outside_the_calendar_are_rejected() {
        let config = small_config(30);
        let mut rng = StdRng::seed_from_u64(3);
        let end = DateTime::<Utc>::MIN_UTC + Duration::days(5);
        let err = Campaign::new_ending_at(end, &config, &mut rng).unwrap_err();
        assert!(err.to_string().contains("date range"), "{err}");
    }

    #[test]
    fn test_unvalidated_tuning_never_reaches_a_run() {
        let mut config = small_config(30);
        config.simulation.winner_up_bias = 1.5;
        let mut rng = StdRng::seed_from_u64(5);
        let err = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap_err();
        assert!(err.to_string().contains("winner_up_bias"), "{err}");
    }

    #[test]
    fn test_csv_covers_every_ad_day_across_batches() {
        let config = small_config(250);
        let mut rng = StdRng::seed_from_u64(29);
        let campaign = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap();
        let report = campaign.run(&mut rng);

        assert_eq!(report.csv.matches("\r\n").count(), 250);
        let first = report.csv.lines().next().unwrap();
        assert!(first.starts_with(&format::date_ymd(campaign.start_date)));
        assert!(first.contains(&campaign.name));
        assert_eq!(first.split(',').count(), CSV_COLUMNS.split(',').count());
    }

    #[test]
    fn test_csv_rows_are_ad_major_within_a_batch() {
        let config = GeneratorConfig {
            days_in_campaign: 3,
            adsets_per_campaign: CountRange::new(1, 1),
            ads_per_adset: CountRange::new(2, 2),
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(31);
        let campaign = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap();
        let report = campaign.run(&mut rng);

        let rows: Vec<&str> = report.csv.lines().collect();
        assert_eq!(rows.len(), 6);
        let ads: Vec<&Ad> = campaign.ads().collect();
        for (i, row) in rows.iter().enumerate() {
            let expected_ad = &ads[i / 3].name;
            assert!(row.contains(expected_ad.as_str()), "row {i}: {row}");
        }
    }

    #[test]
    fn test_table_sample_is_capped() {
        let config = GeneratorConfig {
            days_in_campaign: 40,
            adsets_per_campaign: CountRange::new(2, 2),
            ads_per_adset: CountRange::new(2, 2),
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(37);
        let campaign = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap();
        let report = campaign.run(&mut rng);
        assert_eq!(report.table.data.len(), 25);
        assert_eq!(report.table.columns.len(), 12);
    }

    #[test]
    fn test_short_campaign_table_holds_every_row() {
        let config = small_config(10);
        let mut rng = StdRng::seed_from_u64(41);
        let campaign = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap();
        let report = campaign.run(&mut rng);
        assert_eq!(report.table.data.len(), 10);
    }

    #[test]
    fn test_same_seed_reproduces_the_report() {
        let config = small_config(45);
        for seed in [0u64, 7, 99] {
            let mut a = StdRng::seed_from_u64(seed);
            let mut b = StdRng::seed_from_u64(seed);
            let ca = Campaign::new_ending_at(fixed_end(), &config, &mut a).unwrap();
            let cb = Campaign::new_ending_at(fixed_end(), &config, &mut b).unwrap();
            let ra = ca.run(&mut a);
            let rb = cb.run(&mut b);
            assert_eq!(ca.name, cb.name);
            assert_eq!(ra.csv, rb.csv);
            assert_eq!(ra.metrics, rb.metrics);
            assert_eq!(ra.table, rb.table);
        }
    }

    #[test]
    fn test_rerun_draws_a_fresh_report() {
        let config = small_config(30);
        let mut rng = StdRng::seed_from_u64(43);
        let campaign = Campaign::new_ending_at(fixed_end(), &config, &mut rng).unwrap();
        let first = campaign.run(&mut rng);
        let second = campaign.run(&mut rng);
        assert_eq!(first.csv.matches("\r\n").count(), 30);
        assert_eq!(second.csv.matches("\r\n").count(), 30);
        assert_ne!(first.csv, second.csv);
    }
}
