//! Risk scorer - aggregates matched threat indicators per asset
//!
//! The formula is `criticality_weight x likelihood x exploitability x 10`,
//! clamped to [0,100]. Likelihood blends a matched-count factor with the
//! mean matched severity; exploitability is the mean matched confidence,
//! so an asset with no matched indicators always scores 0.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use threatscope_cache::{CacheKey, CacheStats, Store};
use threatscope_common::RiskConfig;
use threatscope_core::{Asset, AssetRisk, ComponentMatcher, NameMatcher, Severity, ThreatIndicator};
use tracing::{debug, info};

/// Risk scoring engine
pub struct RiskScorer {
    config: RiskConfig,
    matcher: Arc<dyn ComponentMatcher>,
    cache: Option<Arc<dyn Store<AssetRisk>>>,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskScorer {
    /// Create a scorer with default weights and name-based matching
    pub fn new() -> Self {
        Self::with_config(RiskConfig::default())
    }

    /// Create a scorer with custom weights
    pub fn with_config(config: RiskConfig) -> Self {
        Self {
            config,
            matcher: Arc::new(NameMatcher),
            cache: None,
        }
    }

    /// Replace the component matching policy
    pub fn with_matcher(mut self, matcher: Arc<dyn ComponentMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Attach a result cache
    pub fn with_cache(mut self, cache: Arc<dyn Store<AssetRisk>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Score a batch of assets against the supplied indicators
    pub fn analyze_asset_risk(
        &self,
        assets: &[Asset],
        indicators: &[ThreatIndicator],
    ) -> Vec<AssetRisk> {
        let results: Vec<AssetRisk> = assets
            .iter()
            .map(|asset| self.analyze_one(asset, indicators))
            .collect();

        let at_risk = results.iter().filter(|r| r.threat_count > 0).count();
        info!(
            assets = assets.len(),
            indicators = indicators.len(),
            at_risk,
            "asset risk analysis complete"
        );
        results
    }

    /// Score a single asset against the supplied indicators
    pub fn analyze_one(&self, asset: &Asset, indicators: &[ThreatIndicator]) -> AssetRisk {
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::compute(
                    "asset_risk",
                    &asset.id,
                    indicators.iter().map(|i| i.id.as_str()),
                );
                cache.get_or_insert_with(key, &|| self.compute(asset, indicators))
            }
            None => self.compute(asset, indicators),
        }
    }

    /// Composite risk score for a single asset (0-100)
    pub fn calculate_risk_score(&self, asset: &Asset, indicators: &[ThreatIndicator]) -> f64 {
        let matched = self.matched_indicators(asset, indicators);
        self.score_from_matches(asset, &matched)
    }

    /// Statistics for the attached cache, if any
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Drop all cached asset risks
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn compute(&self, asset: &Asset, indicators: &[ThreatIndicator]) -> AssetRisk {
        let matched = self.matched_indicators(asset, indicators);
        let risk_score = self.score_from_matches(asset, &matched);

        let critical_threats = matched
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .count();

        let vulnerable_software: Vec<String> = asset
            .software
            .iter()
            .filter(|pkg| {
                matched
                    .iter()
                    .any(|i| self.matcher.matches(&i.value, pkg))
            })
            .map(|pkg| pkg.name.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();

        let exposure_window_days = matched
            .iter()
            .filter_map(|i| i.first_seen)
            .min()
            .map(|earliest| (Utc::now() - earliest).num_days());

        let recommendations = self.recommendations(
            asset,
            &matched,
            risk_score,
            critical_threats,
            &vulnerable_software,
        );

        debug!(
            asset = %asset.id,
            risk_score,
            matched = matched.len(),
            critical = critical_threats,
            "scored asset"
        );

        AssetRisk {
            asset_id: asset.id.clone(),
            risk_score,
            threat_count: matched.len(),
            critical_threats,
            vulnerable_software,
            recommendations,
            exposure_window_days,
        }
    }

    /// Indicators that apply to the asset, counted once per value
    fn matched_indicators<'a>(
        &self,
        asset: &Asset,
        indicators: &'a [ThreatIndicator],
    ) -> Vec<&'a ThreatIndicator> {
        let mut seen_values: HashSet<&str> = HashSet::new();
        indicators
            .iter()
            .filter(|indicator| {
                self.applies_to(asset, indicator) && seen_values.insert(indicator.value.as_str())
            })
            .collect()
    }

    /// An indicator applies when its value is one of the asset's IP
    /// addresses or matches an installed software entry
    fn applies_to(&self, asset: &Asset, indicator: &ThreatIndicator) -> bool {
        if asset.ip_addresses.contains(indicator.value.as_str()) {
            return true;
        }
        asset
            .software
            .iter()
            .any(|pkg| self.matcher.matches(&indicator.value, pkg))
    }

    fn score_from_matches(&self, asset: &Asset, matched: &[&ThreatIndicator]) -> f64 {
        if matched.is_empty() {
            return 0.0;
        }

        let count_factor = (matched.len() as f64 / 10.0).min(1.0);
        let severity_factor =
            matched.iter().map(|i| i.severity.weight()).sum::<f64>() / matched.len() as f64;
        let likelihood =
            self.config.count_weight * count_factor + self.config.severity_weight * severity_factor;
        let exploitability =
            matched.iter().map(|i| i.confidence).sum::<f64>() / matched.len() as f64;

        (asset.criticality.weight() * likelihood * exploitability * 10.0).clamp(0.0, 100.0)
    }

    fn recommendations(
        &self,
        asset: &Asset,
        matched: &[&ThreatIndicator],
        risk_score: f64,
        critical_threats: usize,
        vulnerable_software: &[String],
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if critical_threats > 0 {
            recommendations.push(format!(
                "Immediately remediate {} critical threat(s) affecting {}",
                critical_threats, asset.name
            ));
        }
        if risk_score >= self.config.isolation_threshold {
            recommendations.push(format!(
                "Isolate {} from the network pending remediation",
                asset.name
            ));
        }
        if !vulnerable_software.is_empty() {
            recommendations.push(format!(
                "Update or patch vulnerable software: {}",
                vulnerable_software.join(", ")
            ));
        }
        if matched.is_empty() {
            recommendations.push(format!(
                "No matched threats for {}; continue routine monitoring",
                asset.name
            ));
        } else {
            recommendations.push(format!(
                "Review {} matched indicator(s) and confirm exposure",
                matched.len()
            ));
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::time::Duration as StdDuration;
    use threatscope_cache::TtlCache;
    use threatscope_core::{AssetType, Criticality, IndicatorType, ThreatType};

    fn critical_web_server() -> Asset {
        Asset::builder("srv-001", "web-frontend")
            .asset_type(AssetType::Server)
            .criticality(Criticality::Critical)
            .ip("10.0.0.5")
            .package("nginx", "1.18.0")
            .build()
            .unwrap()
    }

    fn indicator(id: &str, value: &str, severity: Severity, confidence: f64) -> ThreatIndicator {
        ThreatIndicator::builder(id, IndicatorType::Pattern, value)
            .threat_type(ThreatType::Exploit)
            .severity(severity)
            .confidence(confidence)
            .build()
            .unwrap()
    }

    #[test]
    fn test_critical_asset_with_critical_match_scores_high() {
        let scorer = RiskScorer::new();
        let asset = critical_web_server();
        let indicators = vec![indicator("ind-1", "nginx", Severity::Critical, 0.9)];

        let score = scorer.calculate_risk_score(&asset, &indicators);
        assert!(score > 50.0);
        assert!(score <= 100.0);
    }

    #[test]
    fn test_no_matches_scores_zero() {
        let scorer = RiskScorer::new();
        let asset = critical_web_server();
        let indicators = vec![indicator("ind-1", "postgres", Severity::Critical, 1.0)];

        assert_eq!(scorer.calculate_risk_score(&asset, &indicators), 0.0);
    }

    #[test]
    fn test_ip_address_match() {
        let scorer = RiskScorer::new();
        let asset = critical_web_server();
        let indicators = vec![ThreatIndicator::builder("ind-ip", IndicatorType::Ip, "10.0.0.5")
            .severity(Severity::High)
            .confidence(0.8)
            .build()
            .unwrap()];

        let result = scorer.analyze_one(&asset, &indicators);
        assert_eq!(result.threat_count, 1);
        assert!(result.risk_score > 0.0);
        // An IP match does not implicate installed software
        assert!(result.vulnerable_software.is_empty());
    }

    #[test]
    fn test_duplicate_values_count_once() {
        let scorer = RiskScorer::new();
        let asset = critical_web_server();
        let indicators = vec![
            indicator("ind-1", "nginx", Severity::High, 0.8),
            indicator("ind-2", "nginx", Severity::High, 0.8),
        ];

        let result = scorer.analyze_one(&asset, &indicators);
        assert_eq!(result.threat_count, 1);
    }

    #[test]
    fn test_monotone_in_matched_count() {
        let scorer = RiskScorer::new();
        let mut asset = critical_web_server();
        for i in 0..6 {
            asset.software.push(threatscope_core::SoftwarePackage::new(
                format!("pkg{}", i),
                "1.0",
            ));
        }

        let few: Vec<ThreatIndicator> = (0..2)
            .map(|i| indicator(&format!("ind-{}", i), &format!("pkg{}", i), Severity::High, 0.8))
            .collect();
        let more: Vec<ThreatIndicator> = (0..5)
            .map(|i| indicator(&format!("ind-{}", i), &format!("pkg{}", i), Severity::High, 0.8))
            .collect();

        let low = scorer.calculate_risk_score(&asset, &few);
        let high = scorer.calculate_risk_score(&asset, &more);
        assert!(high >= low);
    }

    #[test]
    fn test_criticality_scales_risk() {
        let indicators = vec![indicator("ind-1", "nginx", Severity::High, 0.8)];
        let scorer = RiskScorer::new();

        let critical = critical_web_server();
        let mut low = critical_web_server();
        low.criticality = Criticality::Low;

        assert!(
            scorer.calculate_risk_score(&critical, &indicators)
                > scorer.calculate_risk_score(&low, &indicators)
        );
    }

    #[test]
    fn test_exposure_window_uses_earliest_sighting() {
        let scorer = RiskScorer::new();
        let asset = critical_web_server();
        let recent = ThreatIndicator::builder("ind-r", IndicatorType::Pattern, "nginx")
            .severity(Severity::High)
            .confidence(0.8)
            .first_seen(Utc::now() - Duration::days(3))
            .build()
            .unwrap();
        let old = ThreatIndicator::builder("ind-o", IndicatorType::Ip, "10.0.0.5")
            .severity(Severity::Low)
            .confidence(0.5)
            .first_seen(Utc::now() - Duration::days(45))
            .build()
            .unwrap();

        let result = scorer.analyze_one(&asset, &[recent, old]);
        assert_eq!(result.exposure_window_days, Some(45));
    }

    #[test]
    fn test_recommendations_for_critical_match() {
        let scorer = RiskScorer::new();
        let asset = critical_web_server();
        let indicators = vec![indicator("ind-1", "nginx", Severity::Critical, 0.95)];

        let result = scorer.analyze_one(&asset, &indicators);
        assert_eq!(result.critical_threats, 1);
        assert_eq!(result.vulnerable_software, vec!["nginx"]);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("Immediately remediate")));
    }

    #[test]
    fn test_isolation_recommended_at_threshold() {
        let scorer = RiskScorer::new();
        let mut asset = critical_web_server();
        for i in 0..10 {
            asset
                .software
                .push(threatscope_core::SoftwarePackage::new(format!("pkg{}", i), "1.0"));
        }
        let indicators: Vec<ThreatIndicator> = (0..10)
            .map(|i| indicator(&format!("ind-{}", i), &format!("pkg{}", i), Severity::Critical, 1.0))
            .collect();

        let result = scorer.analyze_one(&asset, &indicators);
        assert!(result.risk_score >= 80.0);
        assert!(result.recommendations.iter().any(|r| r.contains("Isolate")));
    }

    #[test]
    fn test_idempotent_without_cache() {
        let scorer = RiskScorer::new();
        let asset = critical_web_server();
        let indicators = vec![indicator("ind-1", "nginx", Severity::High, 0.8)];

        let first = scorer.analyze_one(&asset, &indicators);
        let second = scorer.analyze_one(&asset, &indicators);
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.threat_count, second.threat_count);
    }

    #[test]
    fn test_cached_analysis_is_transparent() {
        let cache: Arc<TtlCache<AssetRisk>> =
            Arc::new(TtlCache::new("asset_risk", StdDuration::from_secs(3600)));
        let scorer = RiskScorer::new().with_cache(cache);
        let asset = critical_web_server();
        let indicators = vec![indicator("ind-1", "nginx", Severity::High, 0.8)];

        let first = scorer.analyze_one(&asset, &indicators);
        let second = scorer.analyze_one(&asset, &indicators);
        assert_eq!(first, second);

        let stats = scorer.cache_stats().unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
    }
}
