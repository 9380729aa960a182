//! ThreatScope Correlate - CVE/threat-intelligence correlation
//!
//! This crate provides the correlation engine that:
//! - Matches CVEs against STIX-like threat objects with multi-signal
//!   confidence scoring
//! - Detects active exploitation evidence
//! - Predicts per-CVE exploit likelihood

pub mod correlator;
pub mod predictor;

pub use correlator::{Correlator, ACTIVE_EXPLOITATION_LABEL};
pub use predictor::ExploitPredictor;
