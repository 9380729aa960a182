//! Correlation engine - matches CVEs against threat intelligence
//!
//! For each CVE, every threat object is scanned for four independent
//! signal types. Signal weights combine as a capped weighted average
//! (never a sum), with a multi-factor boost when more than two signal
//! types matched, then the exploit-availability and active-exploitation
//! bonuses are added, each clamped to 1.0.

use std::collections::BTreeSet;
use std::sync::Arc;

use threatscope_cache::{CacheKey, CacheStats, Store};
use threatscope_common::CorrelationConfig;
use threatscope_core::{Cve, ThreatCorrelation, ThreatObject, ThreatObjectType};
use tracing::{debug, info};

/// Label marking observed in-the-wild exploitation
pub const ACTIVE_EXPLOITATION_LABEL: &str = "active-exploitation";

/// Labels indicating exploitation-type activity
const EXPLOITATION_LABELS: [&str; 4] = ["exploit", "exploitation", "exploit-kit", "weaponized"];

/// Correlation engine
pub struct Correlator {
    config: CorrelationConfig,
    cache: Option<Arc<dyn Store<ThreatCorrelation>>>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    /// Create a correlator with default weights and no cache
    pub fn new() -> Self {
        Self::with_config(CorrelationConfig::default())
    }

    /// Create a correlator with custom weights
    pub fn with_config(config: CorrelationConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Attach a result cache
    pub fn with_cache(mut self, cache: Arc<dyn Store<ThreatCorrelation>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Correlate a batch of CVEs against the supplied threat objects
    ///
    /// Every CVE yields exactly one record; a CVE nothing referenced or
    /// mentioned still produces a zero-score record so callers can tell
    /// "checked, no match" from "not checked".
    pub fn correlate(
        &self,
        vulnerabilities: &[Cve],
        threats: &[ThreatObject],
    ) -> Vec<ThreatCorrelation> {
        let results: Vec<ThreatCorrelation> = vulnerabilities
            .iter()
            .map(|cve| self.correlate_one(cve, threats))
            .collect();

        let matched = results.iter().filter(|r| r.is_matched()).count();
        info!(
            vulnerabilities = vulnerabilities.len(),
            threats = threats.len(),
            matched,
            "correlation complete"
        );
        results
    }

    /// Correlate a single CVE against the supplied threat objects
    pub fn correlate_one(&self, cve: &Cve, threats: &[ThreatObject]) -> ThreatCorrelation {
        match &self.cache {
            Some(cache) => {
                let key = CacheKey::compute(
                    "correlation",
                    &cve.id,
                    threats.iter().map(|t| t.id.as_str()),
                );
                cache.get_or_insert_with(key, &|| self.compute(cve, threats))
            }
            None => self.compute(cve, threats),
        }
    }

    /// Whether any threat object matching the CVE carries the
    /// active-exploitation label
    ///
    /// The exploit predictor reuses this check.
    pub fn has_active_exploitation(&self, cve: &Cve, threats: &[ThreatObject]) -> bool {
        threats
            .iter()
            .any(|object| object_matches(cve, object) && object.has_label(ACTIVE_EXPLOITATION_LABEL))
    }

    /// Statistics for the attached cache, if any
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Drop all cached correlations
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn compute(&self, cve: &Cve, threats: &[ThreatObject]) -> ThreatCorrelation {
        let mut matched_ids = BTreeSet::new();
        let mut threat_actors = BTreeSet::new();
        let mut campaigns = BTreeSet::new();
        let mut techniques = BTreeSet::new();

        let mut reference_hit = false;
        let mut mention_hit = false;
        let mut exploit_label_hit = false;
        let mut active_label_hit = false;

        for object in threats {
            let is_reference = object.references_id(&cve.id);
            let is_mention = mentions_cve(object, &cve.id);
            if !is_reference && !is_mention {
                continue;
            }

            matched_ids.insert(object.id.clone());
            reference_hit |= is_reference;
            mention_hit |= is_mention;
            exploit_label_hit |= has_exploitation_label(object);
            active_label_hit |= object.has_label(ACTIVE_EXPLOITATION_LABEL);

            match object.object_type {
                ThreatObjectType::ThreatActor => {
                    threat_actors.insert(object.id.clone());
                }
                ThreatObjectType::Campaign => {
                    campaigns.insert(object.id.clone());
                }
                _ => {}
            }
            for technique in technique_ids(object) {
                techniques.insert(technique);
            }
        }

        if matched_ids.is_empty() {
            return ThreatCorrelation::unmatched(cve.id.clone());
        }

        let mut signals = Vec::with_capacity(4);
        if reference_hit {
            signals.push(self.config.reference_weight);
        }
        if mention_hit {
            signals.push(self.config.mention_weight);
        }
        if exploit_label_hit {
            signals.push(self.config.exploit_label_weight);
        }
        if active_label_hit {
            signals.push(self.config.active_label_weight);
        }

        let mut score = signals.iter().sum::<f64>() / signals.len() as f64;
        if signals.len() > 2 {
            score *= self.config.multi_factor_boost;
        }
        score = score.min(1.0);

        if cve.exploit_available {
            score = (score + self.config.exploit_weight).min(1.0);
        }
        if active_label_hit {
            score = (score + self.config.active_exploitation_weight).min(1.0);
        }

        debug!(
            cve = %cve.id,
            score,
            signals = signals.len(),
            matched = matched_ids.len(),
            active = active_label_hit,
            "correlated CVE against threat intelligence"
        );

        ThreatCorrelation {
            cve_id: cve.id.clone(),
            threat_indicators: matched_ids.into_iter().collect(),
            correlation_score: score,
            active_exploitation: active_label_hit,
            exploit_available: cve.exploit_available,
            threat_actors: threat_actors.into_iter().collect(),
            campaigns: campaigns.into_iter().collect(),
            techniques: techniques.into_iter().collect(),
        }
    }
}

/// Reference or mention - the two match conditions tying an object to a CVE
fn object_matches(cve: &Cve, object: &ThreatObject) -> bool {
    object.references_id(&cve.id) || mentions_cve(object, &cve.id)
}

fn mentions_cve(object: &ThreatObject, cve_id: &str) -> bool {
    if object.has_label(cve_id) {
        return true;
    }
    object
        .description
        .to_ascii_uppercase()
        .contains(&cve_id.to_ascii_uppercase())
}

fn has_exploitation_label(object: &ThreatObject) -> bool {
    EXPLOITATION_LABELS
        .iter()
        .any(|label| object.has_label(label))
}

/// ATT&CK technique ids carried by an object's external references
fn technique_ids(object: &ThreatObject) -> Vec<String> {
    let re = regex::Regex::new(r"^T\d{4}(\.\d{3})?$").unwrap();
    object
        .external_references
        .iter()
        .filter(|r| r.source_name.eq_ignore_ascii_case("mitre-attack"))
        .filter(|r| re.is_match(&r.external_id))
        .map(|r| r.external_id.clone())
        .collect()
}
