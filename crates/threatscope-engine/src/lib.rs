//! ThreatScope Engine - the analysis facade
//!
//! Bundles the correlation engine, risk scorer, SBOM analyzer, and
//! exploit predictor behind one configured entry point. Callers
//! construct validated entities, pass lists to one of the four analysis
//! operations, and receive immutable results; enabled caches are
//! consulted and written through per operation.
//!
//! # Example
//!
//! ```
//! use threatscope_engine::ThreatScope;
//! use threatscope_core::{Cve, ThreatObject, ThreatObjectType};
//!
//! let engine = ThreatScope::new();
//! let cve = Cve::builder("CVE-2024-1234")
//!     .cvss_score(9.8)
//!     .exploit_available(true)
//!     .build()
//!     .unwrap();
//! let intel = ThreatObject::builder("indicator--1", ThreatObjectType::Indicator)
//!     .reference("cve", "CVE-2024-1234")
//!     .label("active-exploitation")
//!     .build()
//!     .unwrap();
//!
//! let correlations = engine.correlate_vulnerabilities(&[cve], &[intel]);
//! assert!(correlations[0].active_exploitation);
//! ```

use std::sync::Arc;
use std::time::Duration;

use threatscope_cache::{CacheStats, TtlCache};
use threatscope_common::Config;
use threatscope_core::{
    Asset, AssetRisk, ComponentMatcher, Cve, Result, SbomThreatAnalysis, ThreatCorrelation,
    ThreatIndicator, ThreatObject,
};
use threatscope_correlate::{Correlator, ExploitPredictor};
use threatscope_risk::RiskScorer;
use threatscope_sbom::{SbomAnalyzer, SbomDocument};

pub use threatscope_common::Config as EngineConfig;

/// The configured analysis facade
pub struct ThreatScope {
    correlator: Correlator,
    risk_scorer: RiskScorer,
    sbom_analyzer: SbomAnalyzer,
    predictor: ExploitPredictor,
}

impl Default for ThreatScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreatScope {
    /// Create an engine with default configuration (caching enabled)
    pub fn new() -> Self {
        Self::from_config(Config::default())
    }

    /// Create an engine from explicit configuration
    pub fn from_config(config: Config) -> Self {
        let mut correlator = Correlator::with_config(config.correlation.clone());
        let mut risk_scorer = RiskScorer::with_config(config.risk.clone());

        if config.cache.enabled {
            let ttl = Duration::from_secs(config.cache.ttl_seconds);
            let correlation_cache: Arc<TtlCache<ThreatCorrelation>> =
                Arc::new(TtlCache::new("correlation", ttl));
            let risk_cache: Arc<TtlCache<AssetRisk>> = Arc::new(TtlCache::new("asset_risk", ttl));
            correlator = correlator.with_cache(correlation_cache);
            risk_scorer = risk_scorer.with_cache(risk_cache);
        }

        Self {
            correlator,
            risk_scorer,
            sbom_analyzer: SbomAnalyzer::new(),
            predictor: ExploitPredictor::with_config(config.correlation),
        }
    }

    /// Replace the component matching policy for the risk scorer and the
    /// SBOM analyzer
    pub fn with_matcher(mut self, matcher: Arc<dyn ComponentMatcher>) -> Self {
        self.risk_scorer = self.risk_scorer.with_matcher(matcher.clone());
        self.sbom_analyzer = self.sbom_analyzer.with_matcher(matcher);
        self
    }

    /// Correlate CVEs against threat intelligence
    pub fn correlate_vulnerabilities(
        &self,
        vulnerabilities: &[Cve],
        threats: &[ThreatObject],
    ) -> Vec<ThreatCorrelation> {
        self.correlator.correlate(vulnerabilities, threats)
    }

    /// Score assets against threat indicators
    pub fn analyze_asset_risk(
        &self,
        assets: &[Asset],
        threat_indicators: &[ThreatIndicator],
    ) -> Vec<AssetRisk> {
        self.risk_scorer.analyze_asset_risk(assets, threat_indicators)
    }

    /// Composite risk score for a single asset (0-100)
    pub fn calculate_risk_score(&self, asset: &Asset, threats: &[ThreatIndicator]) -> f64 {
        self.risk_scorer.calculate_risk_score(asset, threats)
    }

    /// Analyze an SBOM JSON document for threat exposure
    pub fn analyze_sbom(
        &self,
        sbom_json: &str,
        threat_data: &[ThreatIndicator],
    ) -> Result<SbomThreatAnalysis> {
        let document = SbomDocument::parse(sbom_json)?;
        Ok(self.sbom_analyzer.analyze(&document, threat_data))
    }

    /// Analyze an already-parsed SBOM document
    pub fn analyze_sbom_document(
        &self,
        sbom: &SbomDocument,
        threat_data: &[ThreatIndicator],
    ) -> SbomThreatAnalysis {
        self.sbom_analyzer.analyze(sbom, threat_data)
    }

    /// Estimate per-CVE exploit likelihood (0-1)
    pub fn predict_exploit_likelihood(
        &self,
        cve: &Cve,
        threat_intelligence: &[ThreatObject],
    ) -> f64 {
        self.predictor.predict(cve, threat_intelligence)
    }

    /// Drop all cached results
    pub fn clear_cache(&self) {
        self.correlator.clear_cache();
        self.risk_scorer.clear_cache();
    }

    /// Per-cache entry counts and hit/miss statistics
    ///
    /// Empty when caching is disabled.
    pub fn cache_stats(&self) -> Vec<CacheStats> {
        [self.correlator.cache_stats(), self.risk_scorer.cache_stats()]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatscope_core::{
        AssetType, Criticality, IndicatorType, Severity, ThreatObjectType, ThreatType,
    };

    fn sample_cve() -> Cve {
        Cve::builder("CVE-2024-1234")
            .description("Remote code execution in example server")
            .cvss(9.8, "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H")
            .exploit_available(true)
            .epss_score(0.85)
            .build()
            .unwrap()
    }

    fn sample_threat_object() -> ThreatObject {
        ThreatObject::builder("indicator--001", ThreatObjectType::Indicator)
            .reference("cve", "CVE-2024-1234")
            .label("exploit")
            .label("active-exploitation")
            .build()
            .unwrap()
    }

    fn sample_asset() -> Asset {
        Asset::builder("srv-001", "web-frontend")
            .asset_type(AssetType::Server)
            .criticality(Criticality::Critical)
            .ip("10.0.0.5")
            .package("nginx", "1.18.0")
            .build()
            .unwrap()
    }

    fn sample_indicator() -> ThreatIndicator {
        ThreatIndicator::builder("ind-001", IndicatorType::Pattern, "nginx")
            .threat_type(ThreatType::Exploit)
            .severity(Severity::Critical)
            .confidence(0.9)
            .build()
            .unwrap()
    }

    #[test]
    fn test_end_to_end_correlation() {
        let engine = ThreatScope::new();
        let results =
            engine.correlate_vulnerabilities(&[sample_cve()], &[sample_threat_object()]);

        assert_eq!(results.len(), 1);
        assert!(results[0].active_exploitation);
        assert!(results[0].correlation_score > 0.9);
    }

    #[test]
    fn test_end_to_end_asset_risk() {
        let engine = ThreatScope::new();
        let results = engine.analyze_asset_risk(&[sample_asset()], &[sample_indicator()]);

        assert_eq!(results.len(), 1);
        assert!(results[0].risk_score > 50.0);
        assert_eq!(results[0].critical_threats, 1);
    }

    #[test]
    fn test_end_to_end_sbom_analysis() {
        let engine = ThreatScope::new();
        let sbom = r#"{
            "spdxVersion": "SPDX-2.3",
            "packages": [
                {"name": "nginx", "versionInfo": "1.18.0"},
                {"name": "openssl", "versionInfo": "1.1.1k"}
            ]
        }"#;
        let analysis = engine.analyze_sbom(sbom, &[sample_indicator()]).unwrap();

        assert_eq!(analysis.vulnerable_components, 1);
        assert!((analysis.threat_exposure - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_sbom_is_an_error() {
        let engine = ThreatScope::new();
        let err = engine.analyze_sbom(r#"{"files": []}"#, &[]).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_end_to_end_prediction() {
        let engine = ThreatScope::new();
        let likelihood = engine.predict_exploit_likelihood(&sample_cve(), &[sample_threat_object()]);

        assert!(likelihood > 0.9);
        assert!(likelihood <= 1.0);
    }

    #[test]
    fn test_cache_stats_grow_by_distinct_keys() {
        let engine = ThreatScope::new();
        let cves = [sample_cve()];
        let threats = [sample_threat_object()];

        engine.correlate_vulnerabilities(&cves, &threats);
        engine.correlate_vulnerabilities(&cves, &threats);
        engine.correlate_vulnerabilities(&cves, &threats);

        let stats = engine.cache_stats();
        let correlation = stats.iter().find(|s| s.name == "correlation").unwrap();
        assert_eq!(correlation.entries, 1);
        assert_eq!(correlation.hits, 2);
    }

    #[test]
    fn test_clear_cache_drops_everything() {
        let engine = ThreatScope::new();
        engine.correlate_vulnerabilities(&[sample_cve()], &[sample_threat_object()]);
        engine.analyze_asset_risk(&[sample_asset()], &[sample_indicator()]);

        engine.clear_cache();
        assert!(engine.cache_stats().iter().all(|s| s.entries == 0));
    }

    #[test]
    fn test_disabled_cache_reports_no_stats_and_stays_deterministic() {
        let config = Config::builder().cache_enabled(false).build();
        let engine = ThreatScope::from_config(config);

        let first = engine.correlate_vulnerabilities(&[sample_cve()], &[sample_threat_object()]);
        let second = engine.correlate_vulnerabilities(&[sample_cve()], &[sample_threat_object()]);

        assert_eq!(first, second);
        assert!(engine.cache_stats().is_empty());
    }
}
