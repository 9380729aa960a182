//! SBOM threat exposure analysis
//!
//! Matches normalized components against threat indicators with the same
//! injected policy the risk scorer uses, then reports a severity-weighted
//! exposure: each vulnerable component contributes its highest matched
//! severity weight, so one critical hit among many components outweighs
//! several low-severity ones.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use threatscope_core::{
    AffectedComponent, ComponentMatcher, NameMatcher, SbomThreatAnalysis, Severity,
    SoftwarePackage, ThreatIndicator,
};
use tracing::{debug, info};

use crate::document::{SbomComponent, SbomDocument};

/// SBOM analysis engine
pub struct SbomAnalyzer {
    matcher: Arc<dyn ComponentMatcher>,
}

impl Default for SbomAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomAnalyzer {
    /// Create an analyzer with name-based matching
    pub fn new() -> Self {
        Self {
            matcher: Arc::new(NameMatcher),
        }
    }

    /// Replace the component matching policy
    pub fn with_matcher(mut self, matcher: Arc<dyn ComponentMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Analyze a parsed SBOM document against threat indicators
    pub fn analyze(
        &self,
        sbom: &SbomDocument,
        threat_data: &[ThreatIndicator],
    ) -> SbomThreatAnalysis {
        let total_components = sbom.components.len();
        if total_components == 0 {
            return SbomThreatAnalysis::empty();
        }

        let mut affected_components = Vec::new();
        let mut critical_vulns = BTreeSet::new();
        let mut high_vulns = BTreeSet::new();
        let mut exposure_weight_sum = 0.0;

        for component in &sbom.components {
            let matches = self.component_matches(component, threat_data);
            if matches.is_empty() {
                continue;
            }

            let highest_severity = matches
                .iter()
                .map(|i| i.severity)
                .max()
                .unwrap_or(Severity::Low);
            exposure_weight_sum += highest_severity.weight();

            for indicator in &matches {
                match indicator.severity {
                    Severity::Critical => {
                        critical_vulns.insert(indicator.value.clone());
                    }
                    Severity::High => {
                        high_vulns.insert(indicator.value.clone());
                    }
                    _ => {}
                }
            }

            debug!(
                component = %component.identifier,
                matches = matches.len(),
                severity = %highest_severity,
                "component matched threat data"
            );

            affected_components.push(AffectedComponent {
                name: component.name.clone(),
                version: component.version.clone(),
                identifier: component.identifier.clone(),
                matched_indicators: matches.iter().map(|i| i.value.clone()).collect(),
                highest_severity,
            });
        }

        let vulnerable_components = affected_components.len();
        let threat_exposure = 100.0 * exposure_weight_sum / total_components as f64;
        let recommendations = build_recommendations(&affected_components);

        info!(
            format = %sbom.format,
            total_components,
            vulnerable_components,
            threat_exposure,
            "SBOM analysis complete"
        );

        SbomThreatAnalysis {
            total_components,
            vulnerable_components,
            threat_exposure,
            critical_vulns: critical_vulns.into_iter().collect(),
            high_vulns: high_vulns.into_iter().collect(),
            affected_components,
            recommendations,
        }
    }

    /// Indicators matching a component, counted once per value
    fn component_matches<'a>(
        &self,
        component: &SbomComponent,
        threat_data: &'a [ThreatIndicator],
    ) -> Vec<&'a ThreatIndicator> {
        let package = SoftwarePackage::new(component.name.clone(), component.version.clone());
        let mut seen_values: HashSet<&str> = HashSet::new();
        threat_data
            .iter()
            .filter(|indicator| {
                self.matcher.matches(&indicator.value, &package)
                    && seen_values.insert(indicator.value.as_str())
            })
            .collect()
    }
}

fn build_recommendations(affected: &[AffectedComponent]) -> Vec<String> {
    let mut recommendations = Vec::new();

    for component in affected {
        if component.highest_severity == Severity::Critical {
            recommendations.push(format!(
                "Upgrade or replace {} {} immediately: matched critical threat intelligence",
                component.name, component.version
            ));
        }
    }
    if !affected.is_empty() {
        recommendations.push(format!(
            "Review and update {} affected component(s)",
            affected.len()
        ));
    }

    recommendations
}
