//! ThreatScope Risk - per-asset risk aggregation
//!
//! Aggregates matched threat indicators per asset into a single
//! comparable 0-100 risk score with remediation guidance.

pub mod scorer;

pub use scorer::RiskScorer;
