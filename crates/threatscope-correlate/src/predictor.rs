//! Exploit likelihood prediction
//!
//! Produces an independent per-CVE estimate of exploitation probability
//! by averaging whichever evidence factors are present. Missing optional
//! fields are absent factors, not zeros; a CVE with no evidence at all
//! scores 0.0.

use chrono::Utc;
use threatscope_common::CorrelationConfig;
use threatscope_core::{Cve, ThreatObject};
use tracing::debug;

use crate::correlator::Correlator;

/// Constant factor contributed by an available public exploit
const EXPLOIT_AVAILABLE_FACTOR: f64 = 0.8;

/// Constant factor contributed by observed active exploitation
const ACTIVE_EXPLOITATION_FACTOR: f64 = 1.0;

/// Days after publication at which the age factor saturates
const AGE_SATURATION_DAYS: f64 = 365.0;

/// Exploit likelihood predictor
pub struct ExploitPredictor {
    correlator: Correlator,
    multi_factor_boost: f64,
}

impl Default for ExploitPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl ExploitPredictor {
    /// Create a predictor with default weights
    pub fn new() -> Self {
        Self::with_config(CorrelationConfig::default())
    }

    /// Create a predictor sharing the correlation engine's configuration
    pub fn with_config(config: CorrelationConfig) -> Self {
        Self {
            multi_factor_boost: config.multi_factor_boost,
            correlator: Correlator::with_config(config),
        }
    }

    /// Estimate the probability that the CVE will be exploited
    ///
    /// Factors, each included only when present:
    /// 1. EPSS score as-is
    /// 2. CVSS score / 10
    /// 3. available exploit -> 0.8
    /// 4. active exploitation in the supplied intelligence -> 1.0
    /// 5. age: min(1.0, days_since_published / 365)
    pub fn predict(&self, cve: &Cve, threat_intelligence: &[ThreatObject]) -> f64 {
        let mut factors = Vec::with_capacity(5);

        if let Some(epss) = cve.epss_score {
            factors.push(epss);
        }
        if let Some(cvss) = cve.cvss_score {
            factors.push(cvss / 10.0);
        }
        if cve.exploit_available {
            factors.push(EXPLOIT_AVAILABLE_FACTOR);
        }
        if self
            .correlator
            .has_active_exploitation(cve, threat_intelligence)
        {
            factors.push(ACTIVE_EXPLOITATION_FACTOR);
        }
        if let Some(published) = cve.published_date {
            let days = (Utc::now() - published).num_days().max(0) as f64;
            factors.push((days / AGE_SATURATION_DAYS).min(1.0));
        }

        if factors.is_empty() {
            return 0.0;
        }

        let mut score = factors.iter().sum::<f64>() / factors.len() as f64;
        if factors.len() > 2 {
            score *= self.multi_factor_boost;
        }
        let score = score.min(1.0);

        debug!(
            cve = %cve.id,
            factors = factors.len(),
            score,
            "predicted exploit likelihood"
        );
        score
    }
}
