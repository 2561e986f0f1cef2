//! Read-only view of the device object graph exposed by the device library.
//!
//! The transport layer owns devices; everything here is a snapshot that the
//! coordinator replaces wholesale on each refresh.

mod client;
#[allow(clippy::module_inception)]
mod device;
mod feature;

pub use client::DeviceClient;
pub use client::DeviceError;
pub use client::DeviceErrorKind;
pub use client::SnapshotDeviceClient;
pub use device::Device;
pub use device::DeviceFamily;
pub use device::DeviceType;
pub use device::HwInfo;
pub use device::legacy_device_id;
pub use device::normalize_mac;
pub use feature::Feature;
pub use feature::FeatureCategory;
pub use feature::FeatureType;
