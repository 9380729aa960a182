//! ThreatScope SBOM - Software Bill of Materials analysis
//!
//! This crate detects and parses SPDX 2.3 and CycloneDX 1.4 JSON
//! documents and scores component threat exposure with the same matching
//! policy the risk scorer uses.

pub mod analyzer;
pub mod document;

pub use analyzer::SbomAnalyzer;
pub use document::{SbomComponent, SbomDocument, SbomFormat};
