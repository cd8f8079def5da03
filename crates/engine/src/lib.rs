//! Synthetic ad-performance data engine — trend phases, per-ad daily
//! synthesis, batched campaign simulation, and rolled-up reporting.

pub mod ad;
pub mod campaign;
pub mod generator;
pub mod rollup;
pub mod table;
pub mod trend;

pub use campaign::{Campaign, CampaignReport};
pub use generator::{generate, generate_with, GenerationOutput};
