//! Derived analysis results
//!
//! Immutable value types produced by the correlation, risk, and SBOM
//! engines. They are constructed once and never mutated afterwards.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// Correlation between a CVE and known threat intelligence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatCorrelation {
    /// The correlated CVE id
    pub cve_id: String,
    /// Ids of threat objects that referenced or mentioned the CVE
    pub threat_indicators: Vec<String>,
    /// Confidence that the CVE is referenced/exploited by known intel (0-1)
    pub correlation_score: f64,
    /// Active exploitation observed in the wild
    pub active_exploitation: bool,
    /// Public exploit available
    pub exploit_available: bool,
    /// Ids of matched threat-actor objects
    pub threat_actors: Vec<String>,
    /// Ids of matched campaign objects
    pub campaigns: Vec<String>,
    /// ATT&CK technique ids referenced by matched objects
    pub techniques: Vec<String>,
}

impl ThreatCorrelation {
    /// Record for a CVE that was checked but matched nothing
    ///
    /// Distinguishes "checked, no match" from "not checked".
    pub fn unmatched(cve_id: impl Into<String>) -> Self {
        Self {
            cve_id: cve_id.into(),
            threat_indicators: Vec::new(),
            correlation_score: 0.0,
            active_exploitation: false,
            exploit_available: false,
            threat_actors: Vec::new(),
            campaigns: Vec::new(),
            techniques: Vec::new(),
        }
    }

    /// Whether any threat object matched this CVE
    pub fn is_matched(&self) -> bool {
        !self.threat_indicators.is_empty()
    }
}

/// Aggregated risk posture for a single asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRisk {
    /// The scored asset id
    pub asset_id: String,
    /// Composite risk score (0-100)
    pub risk_score: f64,
    /// Number of distinct matched indicators
    pub threat_count: usize,
    /// Number of matched indicators rated critical
    pub critical_threats: usize,
    /// Names of installed software matched by an indicator
    pub vulnerable_software: Vec<String>,
    /// Templated remediation guidance
    pub recommendations: Vec<String>,
    /// Days since the earliest matched indicator was first seen
    pub exposure_window_days: Option<i64>,
}

/// A normalized SBOM component paired with its matched indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedComponent {
    /// Component name
    pub name: String,
    /// Component version
    pub version: String,
    /// Stable component identifier (purl when available)
    pub identifier: String,
    /// Values of indicators that matched this component
    pub matched_indicators: Vec<String>,
    /// Highest severity among the matches
    pub highest_severity: Severity,
}

/// Threat exposure analysis of an SBOM document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SbomThreatAnalysis {
    /// Distinct components in the document
    pub total_components: usize,
    /// Components with at least one matched indicator
    pub vulnerable_components: usize,
    /// Severity-weighted exposure (0-100)
    pub threat_exposure: f64,
    /// Matched indicator values rated critical
    pub critical_vulns: Vec<String>,
    /// Matched indicator values rated high
    pub high_vulns: Vec<String>,
    /// Vulnerable components with their matches
    pub affected_components: Vec<AffectedComponent>,
    /// Templated remediation guidance
    pub recommendations: Vec<String>,
}

impl SbomThreatAnalysis {
    /// Analysis of a document with no components
    pub fn empty() -> Self {
        Self {
            total_components: 0,
            vulnerable_components: 0,
            threat_exposure: 0.0,
            critical_vulns: Vec::new(),
            high_vulns: Vec::new(),
            affected_components: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_correlation() {
        let correlation = ThreatCorrelation::unmatched("CVE-2024-9999");
        assert_eq!(correlation.correlation_score, 0.0);
        assert!(!correlation.active_exploitation);
        assert!(!correlation.is_matched());
    }

    #[test]
    fn test_empty_sbom_analysis() {
        let analysis = SbomThreatAnalysis::empty();
        assert_eq!(analysis.total_components, 0);
        assert_eq!(analysis.threat_exposure, 0.0);
    }
}
