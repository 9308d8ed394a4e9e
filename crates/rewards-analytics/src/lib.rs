//! Behavioral analytics for Maven Rewards.
//!
//! Consumes the partitioned merged table and derives RFM segment
//! assignments, offer-performance statistics, customer lifetime values and
//! transaction summaries; `pipeline` wires the full run end to end.

pub mod clv;
pub mod offers;
pub mod pipeline;
pub mod rfm;
pub mod transactions;

pub use rewards_core as core;
