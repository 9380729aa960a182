//! Threat intelligence entities - STIX-like objects and atomic indicators

use crate::error::{Error, Result};
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// STIX domain object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreatObjectType {
    Indicator,
    Malware,
    Campaign,
    ThreatActor,
    AttackPattern,
    IntrusionSet,
    Tool,
    Report,
}

impl ThreatObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatObjectType::Indicator => "indicator",
            ThreatObjectType::Malware => "malware",
            ThreatObjectType::Campaign => "campaign",
            ThreatObjectType::ThreatActor => "threat-actor",
            ThreatObjectType::AttackPattern => "attack-pattern",
            ThreatObjectType::IntrusionSet => "intrusion-set",
            ThreatObjectType::Tool => "tool",
            ThreatObjectType::Report => "report",
        }
    }
}

impl std::fmt::Display for ThreatObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ThreatObjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "indicator" => Ok(ThreatObjectType::Indicator),
            "malware" => Ok(ThreatObjectType::Malware),
            "campaign" => Ok(ThreatObjectType::Campaign),
            "threat-actor" => Ok(ThreatObjectType::ThreatActor),
            "attack-pattern" => Ok(ThreatObjectType::AttackPattern),
            "intrusion-set" => Ok(ThreatObjectType::IntrusionSet),
            "tool" => Ok(ThreatObjectType::Tool),
            "report" => Ok(ThreatObjectType::Report),
            _ => Err(Error::InvalidEnum {
                field: "threat_object_type",
                value: s.to_string(),
            }),
        }
    }
}

/// External reference carried by a threat object (e.g. a CVE or ATT&CK id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    /// Reference source (e.g. "cve", "mitre-attack")
    pub source_name: String,
    /// Identifier within the source (e.g. "CVE-2024-1234", "T1190")
    pub external_id: String,
}

impl ExternalReference {
    pub fn new(source_name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            external_id: external_id.into(),
        }
    }
}

/// A STIX-like threat intelligence object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatObject {
    /// Object identifier
    pub id: String,
    /// Object type
    pub object_type: ThreatObjectType,
    /// Creation timestamp
    pub created: Option<DateTime<Utc>>,
    /// Last modification timestamp
    pub modified: Option<DateTime<Utc>>,
    /// Open-vocabulary labels
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// External references
    #[serde(default)]
    pub external_references: Vec<ExternalReference>,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

impl ThreatObject {
    /// Create a new threat object builder
    pub fn builder(id: impl Into<String>, object_type: ThreatObjectType) -> ThreatObjectBuilder {
        ThreatObjectBuilder::new(id, object_type)
    }

    /// Check whether this object carries a given label (case-insensitive)
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    /// Check whether any external reference carries the given id
    pub fn references_id(&self, external_id: &str) -> bool {
        self.external_references
            .iter()
            .any(|r| r.external_id.eq_ignore_ascii_case(external_id))
    }
}

/// Builder for constructing validated threat objects
pub struct ThreatObjectBuilder {
    object: ThreatObject,
}

impl ThreatObjectBuilder {
    pub fn new(id: impl Into<String>, object_type: ThreatObjectType) -> Self {
        Self {
            object: ThreatObject {
                id: id.into(),
                object_type,
                created: None,
                modified: None,
                labels: BTreeSet::new(),
                external_references: Vec::new(),
                description: String::new(),
            },
        }
    }

    pub fn created(mut self, when: DateTime<Utc>) -> Self {
        self.object.created = Some(when);
        self
    }

    pub fn modified(mut self, when: DateTime<Utc>) -> Self {
        self.object.modified = Some(when);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.object.labels.insert(label.into());
        self
    }

    pub fn reference(mut self, source_name: impl Into<String>, external_id: impl Into<String>) -> Self {
        self.object
            .external_references
            .push(ExternalReference::new(source_name, external_id));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.object.description = description.into();
        self
    }

    /// Validate and build the threat object
    pub fn build(self) -> Result<ThreatObject> {
        if self.object.id.is_empty() {
            return Err(Error::InvalidEntity {
                entity: "threat_object",
                message: "id must not be empty".into(),
            });
        }
        Ok(self.object)
    }
}

/// Indicator value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorType {
    Ip,
    Domain,
    Hash,
    Cve,
    Pattern,
}

impl IndicatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorType::Ip => "ip",
            IndicatorType::Domain => "domain",
            IndicatorType::Hash => "hash",
            IndicatorType::Cve => "cve",
            IndicatorType::Pattern => "pattern",
        }
    }
}

impl FromStr for IndicatorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ip" => Ok(IndicatorType::Ip),
            "domain" => Ok(IndicatorType::Domain),
            "hash" => Ok(IndicatorType::Hash),
            "cve" => Ok(IndicatorType::Cve),
            "pattern" => Ok(IndicatorType::Pattern),
            _ => Err(Error::InvalidEnum {
                field: "indicator_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Threat classification of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatType {
    Malware,
    Exploit,
    Apt,
}

impl ThreatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatType::Malware => "malware",
            ThreatType::Exploit => "exploit",
            ThreatType::Apt => "apt",
        }
    }
}

impl FromStr for ThreatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "malware" => Ok(ThreatType::Malware),
            "exploit" => Ok(ThreatType::Exploit),
            "apt" => Ok(ThreatType::Apt),
            _ => Err(Error::InvalidEnum {
                field: "threat_type",
                value: s.to_string(),
            }),
        }
    }
}

/// An atomic threat indicator (IOC)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatIndicator {
    /// Indicator identifier
    pub id: String,
    /// Value type
    pub indicator_type: IndicatorType,
    /// Observable value (IP, domain, hash, CVE id, pattern)
    pub value: String,
    /// Threat classification
    pub threat_type: ThreatType,
    /// Source confidence (0-1)
    pub confidence: f64,
    /// Severity rating
    pub severity: Severity,
    /// First sighting
    pub first_seen: Option<DateTime<Utc>>,
    /// Most recent sighting
    pub last_seen: Option<DateTime<Utc>>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ThreatIndicator {
    /// Create a new indicator builder
    pub fn builder(
        id: impl Into<String>,
        indicator_type: IndicatorType,
        value: impl Into<String>,
    ) -> ThreatIndicatorBuilder {
        ThreatIndicatorBuilder::new(id, indicator_type, value)
    }
}

/// Builder for constructing validated threat indicators
pub struct ThreatIndicatorBuilder {
    indicator: ThreatIndicator,
}

impl ThreatIndicatorBuilder {
    pub fn new(
        id: impl Into<String>,
        indicator_type: IndicatorType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            indicator: ThreatIndicator {
                id: id.into(),
                indicator_type,
                value: value.into(),
                threat_type: ThreatType::Malware,
                confidence: 0.5,
                severity: Severity::Medium,
                first_seen: None,
                last_seen: None,
                tags: Vec::new(),
            },
        }
    }

    pub fn threat_type(mut self, threat_type: ThreatType) -> Self {
        self.indicator.threat_type = threat_type;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.indicator.confidence = confidence;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.indicator.severity = severity;
        self
    }

    pub fn first_seen(mut self, when: DateTime<Utc>) -> Self {
        self.indicator.first_seen = Some(when);
        self
    }

    pub fn last_seen(mut self, when: DateTime<Utc>) -> Self {
        self.indicator.last_seen = Some(when);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.indicator.tags.push(tag.into());
        self
    }

    /// Validate and build the indicator
    pub fn build(self) -> Result<ThreatIndicator> {
        if self.indicator.id.is_empty() {
            return Err(Error::InvalidEntity {
                entity: "threat_indicator",
                message: "id must not be empty".into(),
            });
        }
        if self.indicator.value.is_empty() {
            return Err(Error::InvalidEntity {
                entity: "threat_indicator",
                message: "value must not be empty".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.indicator.confidence) {
            return Err(Error::ScoreOutOfRange {
                field: "confidence",
                value: self.indicator.confidence,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(self.indicator)
    }
}
