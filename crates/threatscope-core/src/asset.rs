//! Asset inventory entities

use crate::error::{Error, Result};
use crate::severity::Criticality;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Asset type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    #[default]
    Server,
    Workstation,
    NetworkDevice,
    Container,
    VirtualMachine,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Server => "server",
            AssetType::Workstation => "workstation",
            AssetType::NetworkDevice => "network_device",
            AssetType::Container => "container",
            AssetType::VirtualMachine => "vm",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "server" => Ok(AssetType::Server),
            "workstation" => Ok(AssetType::Workstation),
            "network_device" => Ok(AssetType::NetworkDevice),
            "container" => Ok(AssetType::Container),
            "vm" | "virtual_machine" => Ok(AssetType::VirtualMachine),
            _ => Err(Error::InvalidEnum {
                field: "asset_type",
                value: s.to_string(),
            }),
        }
    }
}

/// An installed software entry on an asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoftwarePackage {
    pub name: String,
    pub version: String,
}

impl SoftwarePackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// An asset under management
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Asset type
    pub asset_type: AssetType,
    /// Assigned IP addresses
    #[serde(default)]
    pub ip_addresses: BTreeSet<String>,
    /// Installed software inventory
    #[serde(default)]
    pub software: Vec<SoftwarePackage>,
    /// Business criticality
    pub criticality: Criticality,
}

impl Asset {
    /// Create a new asset builder
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> AssetBuilder {
        AssetBuilder::new(id, name)
    }
}

/// Builder for constructing validated assets
pub struct AssetBuilder {
    asset: Asset,
}

impl AssetBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            asset: Asset {
                id: id.into(),
                name: name.into(),
                asset_type: AssetType::Server,
                ip_addresses: BTreeSet::new(),
                software: Vec::new(),
                criticality: Criticality::Medium,
            },
        }
    }

    pub fn asset_type(mut self, asset_type: AssetType) -> Self {
        self.asset.asset_type = asset_type;
        self
    }

    pub fn criticality(mut self, criticality: Criticality) -> Self {
        self.asset.criticality = criticality;
        self
    }

    pub fn ip(mut self, address: impl Into<String>) -> Self {
        self.asset.ip_addresses.insert(address.into());
        self
    }

    pub fn package(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.asset.software.push(SoftwarePackage::new(name, version));
        self
    }

    /// Validate and build the asset
    pub fn build(self) -> Result<Asset> {
        if self.asset.id.is_empty() {
            return Err(Error::InvalidEntity {
                entity: "asset",
                message: "id must not be empty".into(),
            });
        }
        Ok(self.asset)
    }
}
