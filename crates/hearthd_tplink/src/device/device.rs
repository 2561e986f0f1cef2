use serde::Deserialize;
use serde::Serialize;

use super::feature::Feature;

/// Kind of device as reported by the device library.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceType {
    Bulb,
    LightStrip,
    Dimmer,
    Hub,
    Plug,
    Strip,
    StripSocket,
    WallSwitch,
    Fan,
    Thermostat,
    Sensor,
    Camera,
    #[serde(other)]
    Unknown,
}

/// Protocol family of a device.
///
/// `Iot` devices speak the legacy protocol and carry identifiers that older
/// releases registered entities under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFamily {
    Iot,
    #[default]
    Smart,
}

/// Hardware and firmware versions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HwInfo {
    #[serde(default)]
    pub sw_ver: String,
    #[serde(default)]
    pub hw_ver: String,
}

/// A physical or logical device and its capabilities.
///
/// Devices form a two-level tree: a root device and its children. Children
/// never have children of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,

    /// User-facing name
    pub alias: String,

    pub model: String,

    /// Network MAC, colon separated
    pub mac: String,

    pub device_type: DeviceType,

    #[serde(default)]
    pub family: DeviceFamily,

    #[serde(default)]
    pub hw_info: HwInfo,

    /// Capabilities, in the order the device library reports them
    #[serde(default)]
    pub features: Vec<Feature>,

    #[serde(default)]
    pub children: Vec<Device>,
}

impl Device {
    /// Look up a feature by its id.
    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Find this device or one of its children by device id.
    pub fn find(&self, device_id: &str) -> Option<&Device> {
        if self.device_id == device_id {
            return Some(self);
        }
        self.children.iter().find(|c| c.device_id == device_id)
    }

    pub fn find_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        if self.device_id == device_id {
            return Some(self);
        }
        self.children.iter_mut().find(|c| c.device_id == device_id)
    }

    pub fn feature_mut(&mut self, id: &str) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.id == id)
    }

    /// Whether the device speaks the legacy protocol.
    pub fn is_legacy(&self) -> bool {
        self.family == DeviceFamily::Iot
    }
}

/// Identifier older releases registered entities under.
///
/// Newer library versions prefix child ids with the parent MAC
/// (`<mac>_<id>`); the legacy identifier is the second `_`-separated
/// segment. Anything after a further `_` is dropped, as older releases did.
pub fn legacy_device_id(device: &Device) -> String {
    match device.device_id.split('_').nth(1) {
        Some(id) => id.to_string(),
        None => device.device_id.clone(),
    }
}

/// Strip separators from a MAC and upper-case it.
pub fn normalize_mac(mac: &str) -> String {
    mac.replace(':', "").to_uppercase()
}
