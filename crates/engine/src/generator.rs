//! Multi-campaign generation — the crate's top-level entry point.
//!
//! One call produces a run: a handful of campaigns simulated end to end,
//! their rows concatenated into a single CSV blob, and a per-campaign
//! digest carrying the summary metrics and table sample.

use adforge_core::config::GeneratorConfig;
use adforge_core::error::ForgeResult;
use adforge_core::format;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::campaign::{csv_header, Campaign, CampaignReport};
use crate::table::TableData;

/// Per-campaign slice of the generation payload. Dates are pre-formatted
/// as `MM/DD/YYYY` display strings; the full row set lives only in the
/// run's CSV blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDigest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub cpm: f64,
    pub ctr: f64,
    pub cac: f64,
    pub aov: f64,
    pub atc_rate: f64,
    pub data: TableData,
}

impl CampaignDigest {
    fn from_report(report: &CampaignReport) -> Self {
        Self {
            name: report.name.clone(),
            start_date: format::date_mdy(report.start_date),
            end_date: format::date_mdy(report.end_date),
            cpm: report.metrics.cpm,
            ctr: report.metrics.ctr,
            cac: report.metrics.cac,
            aov: report.metrics.aov,
            atc_rate: report.metrics.atc_rate,
            data: report.table.clone(),
        }
    }
}

/// Everything one generation run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Suggested file name for the blob: campaign names joined with `_`,
    /// plus the `.csv` extension.
    pub csv_name: String,
    /// Full CSV text, header included. Excluded from the serialized
    /// payload; persisting the blob is the caller's concern.
    #[serde(skip_serializing, default)]
    pub csv: String,
    pub campaigns: Vec<CampaignDigest>,
}

impl GenerationOutput {
    /// The payload as pretty-printed JSON. The CSV blob is not part of it.
    pub fn to_json(&self) -> ForgeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Generate a full run from `config`, seeding the RNG from `config.seed`
/// or from entropy when no seed is set.
pub fn generate(config: &GeneratorConfig) -> ForgeResult<GenerationOutput> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_with(config, &mut rng)
}

/// Generate with a caller-supplied RNG.
pub fn generate_with<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> ForgeResult<GenerationOutput> {
    generate_ending_at(Utc::now(), config, rng)
}

/// Fully pinned variant: explicit campaign end timestamp and RNG. With
/// both fixed, the CSV blob, file name, and digests reproduce exactly.
pub fn generate_ending_at<R: Rng + ?Sized>(
    end_date: DateTime<Utc>,
    config: &GeneratorConfig,
    rng: &mut R,
) -> ForgeResult<GenerationOutput> {
    config.validate()?;

    let num_campaigns = config.campaigns_per_run.sample(rng);
    info!(
        campaigns = num_campaigns,
        days = config.days_in_campaign,
        "generation run started"
    );

    let mut csv = csv_header();
    let mut csv_name = String::new();
    let mut campaigns = Vec::with_capacity(num_campaigns as usize);

    for _ in 0..num_campaigns {
        let campaign = Campaign::new_ending_at(end_date, config, rng)?;
        if !csv_name.is_empty() {
            csv_name.push('_');
        }
        csv_name.push_str(&campaign.name);

        let report = campaign.run(rng);
        csv.push_str(&report.csv);
        campaigns.push(CampaignDigest::from_report(&report));
    }
    csv_name.push_str(".csv");

    let output = GenerationOutput {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        csv_name,
        csv,
        campaigns,
    };
    info!(
        run_id = %output.run_id,
        campaigns = output.campaigns.len(),
        csv_bytes = output.csv.len(),
        "generation run finished"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_core::sample::CountRange;
    use chrono::TimeZone;

    fn fixed_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn two_campaign_config() -> GeneratorConfig {
        GeneratorConfig {
            campaigns_per_run: CountRange::new(2, 2),
            days_in_campaign: 8,
            adsets_per_campaign: CountRange::new(1, 1),
            ads_per_adset: CountRange::new(1, 1),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_run_emits_one_digest_per_campaign() {
        let config = two_campaign_config();
        let mut rng = StdRng::seed_from_u64(51);
        let output = generate_ending_at(fixed_end(), &config, &mut rng).unwrap();

        assert_eq!(output.campaigns.len(), 2);
        for digest in &output.campaigns {
            assert!(digest.name.starts_with("Campaign_"));
            assert_eq!(digest.start_date, "04/23/2024");
            assert_eq!(digest.end_date, "05/01/2024");
            assert_eq!(digest.data.data.len(), 8);
        }
    }

    #[test]
    fn test_csv_name_joins_campaign_names() {
        let config = two_campaign_config();
        let mut rng = StdRng::seed_from_u64(53);
        let output = generate_ending_at(fixed_end(), &config, &mut rng).unwrap();

        let expected = format!(
            "{}_{}.csv",
            output.campaigns[0].name, output.campaigns[1].name
        );
        assert_eq!(output.csv_name, expected);
    }

    #[test]
    fn test_blob_has_one_header_and_all_rows() {
        let config = two_campaign_config();
        let mut rng = StdRng::seed_from_u64(57);
        let output = generate_ending_at(fixed_end(), &config, &mut rng).unwrap();

        assert!(output.csv.starts_with(crate::campaign::CSV_COLUMNS));
        assert_eq!(output.csv.matches("Date,Ad name").count(), 1);
        // header + 8 days for each of the two single-ad campaigns
        assert_eq!(output.csv.matches("\r\n").count(), 1 + 16);
    }

    #[test]
    fn test_serialized_payload_excludes_the_blob() {
        let config = two_campaign_config();
        let mut rng = StdRng::seed_from_u64(59);
        let output = generate_ending_at(fixed_end(), &config, &mut rng).unwrap();

        let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("csv"));
        assert!(object.contains_key("run_id"));
        assert!(object.contains_key("csv_name"));
        assert_eq!(json["campaigns"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_fixed_seed_reproduces_blob_name_and_digests() {
        let config = GeneratorConfig {
            days_in_campaign: 140,
            ..two_campaign_config()
        };
        let mut a = StdRng::seed_from_u64(4242);
        let mut b = StdRng::seed_from_u64(4242);
        let first = generate_ending_at(fixed_end(), &config, &mut a).unwrap();
        let second = generate_ending_at(fixed_end(), &config, &mut b).unwrap();

        assert_eq!(first.csv, second.csv);
        assert_eq!(first.csv_name, second.csv_name);
        assert_eq!(first.campaigns, second.campaigns);
        assert_ne!(first.run_id, second.run_id);
    }

    #[test]
    fn test_invalid_config_fails_before_any_simulation() {
        let config = GeneratorConfig {
            days_in_campaign: 0,
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(61);
        let err = generate_ending_at(fixed_end(), &config, &mut rng).unwrap_err();
        assert!(err.to_string().contains("days_in_campaign"));
    }

    #[test]
    fn test_oversized_day_count_fails_with_a_config_error() {
        let config = GeneratorConfig {
            days_in_campaign: 200_000_000,
            ..GeneratorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(63);
        let err = generate_ending_at(fixed_end(), &config, &mut rng).unwrap_err();
        assert!(err.to_string().contains("days_in_campaign"), "{err}");
    }
}
