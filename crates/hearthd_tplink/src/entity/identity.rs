//! Unique ids and device registry placement.
//!
//! Unique ids must match whatever earlier releases registered for the same
//! device and feature, so the derivation rules below are frozen.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::category::EntityCategory;
use super::category::category_for_feature;
use crate::device::Device;
use crate::device::DeviceType;
use crate::device::Feature;
use crate::device::FeatureCategory;
use crate::device::normalize_mac;
use crate::platforms::Platform;

/// Registry domain of this integration
pub const DOMAIN: &str = "tplink";

pub const MANUFACTURER: &str = "TP-Link";

/// Feature id of a device's main on/off state
pub const PRIMARY_STATE_ID: &str = "state";

/// Connection type for network MAC addresses
pub const CONNECTION_NETWORK_MAC: &str = "mac";

/// A `(domain, id)` pair identifying a registry device.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self(DOMAIN.to_string(), device_id.into())
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// How a registry device is anchored.
///
/// Root devices are found through their network connection; devices reached
/// through another device point back at it instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryLink {
    /// `(connection type, value)` pairs
    Connections(BTreeSet<(String, String)>),
    ViaDevice(DeviceIdentifier),
}

/// Registry device record an entity is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: BTreeSet<DeviceIdentifier>,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    pub sw_version: String,
    pub hw_version: String,
    pub link: RegistryLink,
}

/// Everything the registry needs to file an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityIdentity {
    pub unique_id: String,
    pub device_info: DeviceInfo,
    /// Entity name forced by registry placement, replacing the description name
    pub name: Option<String>,
    pub entity_category: Option<EntityCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("No unique id can be derived for {platform} entity on device {device_id}")]
    NoUniqueId {
        device_id: String,
        platform: Platform,
    },
}

/// Inputs to identity resolution for one entity.
#[derive(Debug, Clone)]
pub struct IdentityRequest<'a> {
    pub device: &'a Device,
    pub feature: Option<&'a Feature>,
    pub parent: Option<&'a Device>,
    pub platform: Platform,
    /// Key of the entity description, for entities not backed by a feature
    pub description_key: Option<&'a str>,
    /// Unique id fixed by the entity itself
    pub unique_id_override: Option<String>,
}

impl<'a> IdentityRequest<'a> {
    pub fn new(device: &'a Device, platform: Platform) -> Self {
        Self {
            device,
            feature: None,
            parent: None,
            platform,
            description_key: None,
            unique_id_override: None,
        }
    }

    pub fn feature(mut self, feature: Option<&'a Feature>) -> Self {
        self.feature = feature;
        self
    }

    pub fn parent(mut self, parent: Option<&'a Device>) -> Self {
        self.parent = parent;
        self
    }

    pub fn description_key(mut self, key: Option<&'a str>) -> Self {
        self.description_key = key;
        self
    }

    pub fn unique_id_override(mut self, unique_id: Option<String>) -> Self {
        self.unique_id_override = unique_id;
        self
    }
}

/// Compute unique id, registry placement and category for an entity.
///
/// `legacy_device_id` is treated as an opaque, stable per-device key.
pub fn resolve_identity(
    request: &IdentityRequest<'_>,
    legacy_device_id: &dyn Fn(&Device) -> String,
) -> Result<EntityIdentity, IdentityError> {
    let device = request.device;

    let mut registry_device = device;
    let mut device_name = device.alias.clone();
    let mut name = None;

    if let Some(parent) = request.parent.filter(|p| p.device_type != DeviceType::Hub) {
        // Sensors always stay on their own device
        let primary = request
            .feature
            .map_or(true, |f| f.category == FeatureCategory::Primary);
        if !request.platform.is_sensor_domain() && primary {
            registry_device = parent;
            device_name = parent.alias.clone();
            name = Some(device.alias.clone());
        } else {
            // Children of one parent often share aliases ("Ceiling Fan"), the
            // parent alias tells them apart.
            device_name = format!("{} {}", parent.alias, device.alias);
        }
    }

    let link = match request.parent {
        Some(parent) if parent.device_id != registry_device.device_id => {
            RegistryLink::ViaDevice(DeviceIdentifier::new(parent.device_id.clone()))
        }
        _ => RegistryLink::Connections(BTreeSet::from([(
            CONNECTION_NETWORK_MAC.to_string(),
            device.mac.clone(),
        )])),
    };

    let device_info = DeviceInfo {
        identifiers: BTreeSet::from([DeviceIdentifier::new(registry_device.device_id.clone())]),
        manufacturer: MANUFACTURER.to_string(),
        model: registry_device.model.clone(),
        name: device_name,
        sw_version: registry_device.hw_info.sw_ver.clone(),
        hw_version: registry_device.hw_info.hw_ver.clone(),
        link,
    };

    Ok(EntityIdentity {
        unique_id: unique_id(request, legacy_device_id)?,
        device_info,
        name,
        entity_category: category_for_feature(request.feature),
    })
}

fn unique_id(
    request: &IdentityRequest<'_>,
    legacy_device_id: &dyn Fn(&Device) -> String,
) -> Result<String, IdentityError> {
    let device = request.device;

    if let Some(feature) = request.feature {
        // The main switch kept the bare device id from before features existed
        if feature.id == PRIMARY_STATE_ID {
            return Ok(legacy_device_id(device));
        }
        return Ok(format!("{}_{}", legacy_device_id(device), feature.id));
    }

    if let Some(unique_id) = &request.unique_id_override {
        return Ok(unique_id.clone());
    }

    if request.platform == Platform::Light {
        // Legacy dimmers were modelled as switches and registered with the
        // switch format.
        if device.device_type == DeviceType::Dimmer && device.is_legacy() {
            return Ok(legacy_device_id(device));
        }
        return Ok(normalize_mac(&device.mac));
    }

    if let Some(key) = request.description_key {
        return Ok(format!("{}_{}", legacy_device_id(device), key));
    }

    Err(IdentityError::NoUniqueId {
        device_id: device.device_id.clone(),
        platform: request.platform,
    })
}
