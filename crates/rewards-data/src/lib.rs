//! Data preparation layer for Maven Rewards.
//!
//! Responsible for cleaning raw customer and offer rows, decoding event
//! payloads, capping outliers, joining the three entity sets into the
//! denormalized working table and partitioning it by event kind.

pub mod capper;
pub mod cleaner;
pub mod decoder;
pub mod merger;
pub mod partitioner;

pub use rewards_core as core;
