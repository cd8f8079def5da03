//! Table sampling — a capped, display-ready slice of the generated rows.
//!
//! The CSV blob holds every row of every batch; the table holds only the
//! first rows, day-major across ads, so a consumer can render a preview
//! without parsing the blob.

use adforge_core::format;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ad::{Ad, AdBatch};

/// Column header plus the row field it reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub header_name: String,
    pub field: String,
}

/// One formatted (day, ad) row. Counts are rounded to whole numbers,
/// revenue and cpm to cents; ctr stays a raw ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub date: String,
    pub ad: String,
    pub spend: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub adds_to_cart: u64,
    pub revenue: f64,
    pub purchases: u64,
    pub campaign: String,
    pub adset: String,
    pub cpm: f64,
    pub ctr: f64,
}

/// Column definitions plus the sampled rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<ColumnDef>,
    pub data: Vec<TableRow>,
}

fn column(header_name: &str, field: &str) -> ColumnDef {
    ColumnDef {
        header_name: header_name.to_string(),
        field: field.to_string(),
    }
}

/// The fixed column set, in display order. The trailing cpm and ctr
/// columns are recomputed from the row's own values rather than sampled.
pub fn columns() -> Vec<ColumnDef> {
    vec![
        column("Date", "date"),
        column("Ad name", "ad"),
        column("Spend", "spend"),
        column("Impressions", "impressions"),
        column("Clicks", "clicks"),
        column("Adds to cart", "adds_to_cart"),
        column("Revenue", "revenue"),
        column("Purchases", "purchases"),
        column("Campaign", "campaign"),
        column("Adset", "adset"),
        column("CPMs", "cpm"),
        column("CTRs", "ctr"),
    ]
}

/// Format one (day, ad) pair. Shared by the CSV writer and the table
/// sampler so both surfaces agree on rounding.
pub(crate) fn format_row(date: DateTime<Utc>, ad: &Ad, batch: &AdBatch, day: usize) -> TableRow {
    let spend = batch.spend[day];
    let impressions = batch.impressions[day];
    let clicks = batch.clicks[day];
    TableRow {
        date: format::date_ymd(date),
        ad: ad.name.clone(),
        spend: spend.round() as u64,
        impressions: impressions.round() as u64,
        clicks: clicks.round() as u64,
        adds_to_cart: batch.adds_to_cart[day].round() as u64,
        revenue: format::currency(batch.revenue[day]),
        purchases: batch.purchases[day].round() as u64,
        campaign: ad.campaign_name.clone(),
        adset: ad.adset_name.clone(),
        cpm: format::currency(spend / (impressions / 1000.0)),
        ctr: clicks / impressions,
    }
}

/// Collects table rows across successive batches until the cap fills.
pub(crate) struct TableSampler {
    cap: usize,
    rows: Vec<TableRow>,
}

impl TableSampler {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            cap,
            rows: Vec::with_capacity(cap),
        }
    }

    /// Offer one batch's results, day-major: every ad's row for day 0, then
    /// every ad's row for day 1, and so on.
    pub(crate) fn offer(
        &mut self,
        batch_start: DateTime<Utc>,
        ads: &[&Ad],
        results: &[AdBatch],
        batch_days: u32,
    ) {
        for day in 0..batch_days as usize {
            let date = batch_start + chrono::Duration::days(day as i64);
            for (ad, batch) in ads.iter().zip(results) {
                if self.rows.len() >= self.cap {
                    return;
                }
                self.rows.push(format_row(date, ad, batch, day));
            }
        }
    }

    pub(crate) fn finish(self) -> TableData {
        TableData {
            columns: columns(),
            data: self.rows,
        }
    }
}
