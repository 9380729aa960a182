//! SBOM document parsing - SPDX 2.3 and CycloneDX 1.4
//!
//! Dialect detection goes by top-level shape: `spdxVersion` marks SPDX,
//! `bomFormat == "CycloneDX"` marks CycloneDX. Anything else is an
//! unsupported format, never a guess.

use serde::Deserialize;
use serde_json::Value;
use threatscope_core::{Error, Result};
use tracing::debug;

/// Recognized SBOM dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbomFormat {
    /// SPDX 2.3 JSON
    Spdx,
    /// CycloneDX 1.4 JSON
    CycloneDx,
}

impl SbomFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SbomFormat::Spdx => "SPDX",
            SbomFormat::CycloneDx => "CycloneDX",
        }
    }
}

impl std::fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A software component normalized out of an SBOM document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SbomComponent {
    /// Component name
    pub name: String,
    /// Component version (may be empty when the document omits it)
    pub version: String,
    /// Stable identifier: purl when the document carries one, else
    /// `name@version`
    pub identifier: String,
}

/// A parsed, normalized SBOM document
#[derive(Debug, Clone)]
pub struct SbomDocument {
    /// Detected dialect
    pub format: SbomFormat,
    /// Normalized components, duplicate name+version entries removed
    pub components: Vec<SbomComponent>,
}

#[derive(Debug, Deserialize)]
struct SpdxDocument {
    #[serde(default)]
    packages: Vec<SpdxPackage>,
}

#[derive(Debug, Deserialize)]
struct SpdxPackage {
    name: String,
    #[serde(rename = "versionInfo", default)]
    version_info: String,
}

#[derive(Debug, Deserialize)]
struct CycloneDxDocument {
    #[serde(default)]
    components: Vec<CycloneDxComponent>,
}

#[derive(Debug, Deserialize)]
struct CycloneDxComponent {
    name: String,
    #[serde(default)]
    version: String,
    purl: Option<String>,
}

impl SbomDocument {
    /// Parse an SBOM document from JSON text
    pub fn parse(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Parse an SBOM document from an already-deserialized JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("spdxVersion").is_some() {
            let document: SpdxDocument = serde_json::from_value(value)?;
            let components = normalize(document.packages.into_iter().map(|p| {
                let identifier = format!("{}@{}", p.name, p.version_info);
                SbomComponent {
                    name: p.name,
                    version: p.version_info,
                    identifier,
                }
            }));
            debug!(format = "SPDX", components = components.len(), "parsed SBOM");
            return Ok(SbomDocument {
                format: SbomFormat::Spdx,
                components,
            });
        }

        if value.get("bomFormat").and_then(Value::as_str) == Some("CycloneDX") {
            let document: CycloneDxDocument = serde_json::from_value(value)?;
            let components = normalize(document.components.into_iter().map(|c| {
                let identifier = c
                    .purl
                    .unwrap_or_else(|| format!("{}@{}", c.name, c.version));
                SbomComponent {
                    name: c.name,
                    version: c.version,
                    identifier,
                }
            }));
            debug!(
                format = "CycloneDX",
                components = components.len(),
                "parsed SBOM"
            );
            return Ok(SbomDocument {
                format: SbomFormat::CycloneDx,
                components,
            });
        }

        Err(Error::UnsupportedFormat(
            "document matches neither SPDX nor CycloneDX shape".into(),
        ))
    }
}

/// Drop duplicate name+version entries, preserving first-seen order
fn normalize(components: impl Iterator<Item = SbomComponent>) -> Vec<SbomComponent> {
    let mut seen = std::collections::HashSet::new();
    components
        .filter(|c| seen.insert((c.name.clone(), c.version.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPDX_DOC: &str = r#"{
        "spdxVersion": "SPDX-2.3",
        "SPDXID": "SPDXRef-DOCUMENT",
        "packages": [
            {"name": "nginx", "versionInfo": "1.18.0"},
            {"name": "openssl", "versionInfo": "1.1.1k"}
        ]
    }"#;

    const CYCLONEDX_DOC: &str = r#"{
        "bomFormat": "CycloneDX",
        "specVersion": "1.4",
        "components": [
            {"name": "log4j-core", "version": "2.14.1", "purl": "pkg:maven/org.apache.logging.log4j/log4j-core@2.14.1"},
            {"name": "jackson-databind", "version": "2.9.10"}
        ]
    }"#;

    #[test]
    fn test_spdx_detection_and_parsing() {
        let document = SbomDocument::parse(SPDX_DOC).unwrap();
        assert_eq!(document.format, SbomFormat::Spdx);
        assert_eq!(document.components.len(), 2);
        assert_eq!(document.components[0].name, "nginx");
        assert_eq!(document.components[0].identifier, "nginx@1.18.0");
    }

    #[test]
    fn test_cyclonedx_detection_and_parsing() {
        let document = SbomDocument::parse(CYCLONEDX_DOC).unwrap();
        assert_eq!(document.format, SbomFormat::CycloneDx);
        assert_eq!(document.components.len(), 2);
        assert_eq!(
            document.components[0].identifier,
            "pkg:maven/org.apache.logging.log4j/log4j-core@2.14.1"
        );
        assert_eq!(document.components[1].identifier, "jackson-databind@2.9.10");
    }

    #[test]
    fn test_unrecognized_shape_is_rejected() {
        let err = SbomDocument::parse(r#"{"artifacts": []}"#).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let err = SbomDocument::parse("not json").unwrap_err();
        assert_eq!(err.code(), "JSON_ERROR");
    }

    #[test]
    fn test_duplicate_components_count_once() {
        let doc = r#"{
            "spdxVersion": "SPDX-2.3",
            "packages": [
                {"name": "nginx", "versionInfo": "1.18.0"},
                {"name": "nginx", "versionInfo": "1.18.0"},
                {"name": "nginx", "versionInfo": "1.19.0"}
            ]
        }"#;
        let document = SbomDocument::parse(doc).unwrap();
        assert_eq!(document.components.len(), 2);
    }

    #[test]
    fn test_empty_component_list_parses() {
        let document = SbomDocument::parse(r#"{"spdxVersion": "SPDX-2.3"}"#).unwrap();
        assert!(document.components.is_empty());
    }
}
