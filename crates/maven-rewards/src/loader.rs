//! JSON record-set loading.
//!
//! Each input file is a JSON array of records matching the raw model
//! shapes; loading is strict, so a malformed file aborts the run with a
//! parse error naming the file.

use std::fs;
use std::path::Path;

use anyhow::Context;
use rewards_core::models::{Offer, RawCustomer, RawEvent};
use tracing::debug;

pub fn load_customers(path: &Path) -> anyhow::Result<Vec<RawCustomer>> {
    let customers: Vec<RawCustomer> = load_array(path)?;
    debug!("loaded {} customer rows from {}", customers.len(), path.display());
    Ok(customers)
}

pub fn load_offers(path: &Path) -> anyhow::Result<Vec<Offer>> {
    let offers: Vec<Offer> = load_array(path)?;
    debug!("loaded {} offer rows from {}", offers.len(), path.display());
    Ok(offers)
}

pub fn load_events(path: &Path) -> anyhow::Result<Vec<RawEvent>> {
    let events: Vec<RawEvent> = load_array(path)?;
    debug!("loaded {} event rows from {}", events.len(), path.display());
    Ok(events)
}

fn load_array<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
