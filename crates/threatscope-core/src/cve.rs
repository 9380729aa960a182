//! CVE vulnerability records

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A disclosed vulnerability, as supplied by an upstream CVE feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cve {
    /// CVE identifier (e.g. "CVE-2024-1234")
    pub id: String,
    /// Vulnerability description
    pub description: String,
    /// CVSS v3 base score (0-10)
    pub cvss_score: Option<f64>,
    /// CVSS v3 vector string
    pub cvss_vector: Option<String>,
    /// Affected CPE string
    pub cpe: Option<String>,
    /// Publication date
    pub published_date: Option<DateTime<Utc>>,
    /// Is a public exploit available
    #[serde(default)]
    pub exploit_available: bool,
    /// EPSS exploitation-probability score (0-1)
    pub epss_score: Option<f64>,
}

impl Cve {
    /// Create a new CVE builder
    pub fn builder(id: impl Into<String>) -> CveBuilder {
        CveBuilder::new(id)
    }

    /// Check a candidate CVE id against the `CVE-YYYY-NNNN+` pattern
    pub fn is_valid_id(id: &str) -> bool {
        let re = regex::Regex::new(r"^CVE-\d{4}-\d{4,}$").unwrap();
        re.is_match(id)
    }
}

/// Extract CVE ids mentioned in free text
pub fn extract_cve_ids(text: &str) -> Vec<String> {
    let re = regex::Regex::new(r"CVE-\d{4}-\d{4,}").unwrap();
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Builder for constructing validated CVE records
pub struct CveBuilder {
    cve: Cve,
}

impl CveBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            cve: Cve {
                id: id.into(),
                description: String::new(),
                cvss_score: None,
                cvss_vector: None,
                cpe: None,
                published_date: None,
                exploit_available: false,
                epss_score: None,
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.cve.description = description.into();
        self
    }

    pub fn cvss(mut self, score: f64, vector: impl Into<String>) -> Self {
        self.cve.cvss_score = Some(score);
        self.cve.cvss_vector = Some(vector.into());
        self
    }

    pub fn cvss_score(mut self, score: f64) -> Self {
        self.cve.cvss_score = Some(score);
        self
    }

    pub fn cpe(mut self, cpe: impl Into<String>) -> Self {
        self.cve.cpe = Some(cpe.into());
        self
    }

    pub fn published(mut self, when: DateTime<Utc>) -> Self {
        self.cve.published_date = Some(when);
        self
    }

    pub fn exploit_available(mut self, available: bool) -> Self {
        self.cve.exploit_available = available;
        self
    }

    pub fn epss_score(mut self, score: f64) -> Self {
        self.cve.epss_score = Some(score);
        self
    }

    /// Validate and build the CVE record
    ///
    /// Raises a validation error for malformed ids or out-of-range scores;
    /// values are never silently coerced.
    pub fn build(self) -> Result<Cve> {
        if !Cve::is_valid_id(&self.cve.id) {
            return Err(Error::InvalidCveId(self.cve.id));
        }
        if let Some(score) = self.cve.cvss_score {
            if !(0.0..=10.0).contains(&score) {
                return Err(Error::ScoreOutOfRange {
                    field: "cvss_score",
                    value: score,
                    min: 0.0,
                    max: 10.0,
                });
            }
        }
        if let Some(score) = self.cve.epss_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(Error::ScoreOutOfRange {
                    field: "epss_score",
                    value: score,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(self.cve)
    }
}
