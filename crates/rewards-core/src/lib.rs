//! Domain types and shared helpers for the Maven Rewards analytics pipeline.
//!
//! Contains the customer / offer / event data model, the error taxonomy,
//! percentile and IQR statistics, the segment-label policy table and the
//! CLI settings shared by all downstream crates.

pub mod error;
pub mod models;
pub mod policy;
pub mod settings;
pub mod stats;

pub use error::{Result, RewardsError};
