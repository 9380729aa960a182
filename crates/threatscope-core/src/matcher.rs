//! Component matching policy - the seam between indicators and software
//!
//! Determining whether a component is affected by a vulnerability is an
//! open problem; the default policy is the name-substring comparison the
//! engine has always used. Callers can inject a CPE- or purl-aware
//! implementation without touching the scorers.

use crate::asset::SoftwarePackage;

/// Policy for deciding whether an indicator value applies to a software
/// component
pub trait ComponentMatcher: Send + Sync {
    /// Does `indicator_value` identify `package`?
    fn matches(&self, indicator_value: &str, package: &SoftwarePackage) -> bool;
}

/// Case-insensitive name-substring matching
///
/// Matches when either string contains the other, so "nginx" matches
/// "nginx-core" and "apache http_server" matches "apache".
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatcher;

impl ComponentMatcher for NameMatcher {
    fn matches(&self, indicator_value: &str, package: &SoftwarePackage) -> bool {
        let value = indicator_value.to_lowercase();
        let name = package.name.to_lowercase();
        if value.is_empty() || name.is_empty() {
            return false;
        }
        value.contains(&name) || name.contains(&value)
    }
}
