use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;

use super::device::Device;

/// Failure reported by the device library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Credentials were rejected by the device or cloud
    #[error("{0}")]
    Authentication(String),

    /// Device did not answer in time
    #[error("{0}")]
    Timeout(String),

    /// Any other device library failure
    #[error("{0}")]
    Device(String),
}

/// Discriminant of [`DeviceError`], used as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceErrorKind {
    Authentication,
    Timeout,
    Device,
}

impl DeviceError {
    pub fn kind(&self) -> DeviceErrorKind {
        match self {
            Self::Authentication(_) => DeviceErrorKind::Authentication,
            Self::Timeout(_) => DeviceErrorKind::Timeout,
            Self::Device(_) => DeviceErrorKind::Device,
        }
    }
}

/// Operations the core needs from the transport layer.
///
/// This trait allows for mocking the device library for testing purposes
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Fetch a fresh snapshot of the device and its children
    async fn update(&self) -> Result<Device, DeviceError>;

    /// Write a new value to a feature of the device or one of its children
    async fn set_feature_value(
        &self,
        device_id: &str,
        feature_id: &str,
        value: serde_json::Value,
    ) -> Result<(), DeviceError>;
}

/// Simulated device backed by a JSON snapshot.
///
/// The snapshot is read once; writes update the in-memory copy so that the
/// next [`update`](DeviceClient::update) reflects them.
pub struct SnapshotDeviceClient {
    device: Mutex<Device>,
}

impl SnapshotDeviceClient {
    pub fn new(device: Device) -> Self {
        Self {
            device: Mutex::new(device),
        }
    }

    /// Load a snapshot from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read device snapshot {}", path.display()))?;
        let device: Device = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse device snapshot {}", path.display()))?;
        Ok(Self::new(device))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Device>, DeviceError> {
        self.device
            .lock()
            .map_err(|e| DeviceError::Device(e.to_string()))
    }
}

#[async_trait]
impl DeviceClient for SnapshotDeviceClient {
    async fn update(&self) -> Result<Device, DeviceError> {
        Ok(self.lock()?.clone())
    }

    async fn set_feature_value(
        &self,
        device_id: &str,
        feature_id: &str,
        value: serde_json::Value,
    ) -> Result<(), DeviceError> {
        let mut root = self.lock()?;
        let device = root
            .find_mut(device_id)
            .ok_or_else(|| DeviceError::Device(format!("Unknown device: {}", device_id)))?;

        let feature = device.feature_mut(feature_id).ok_or_else(|| {
            DeviceError::Device(format!(
                "Unknown feature {} on device {}",
                feature_id, device_id
            ))
        })?;
        feature.value = value;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_snapshot_client_applies_writes() {
        let client = SnapshotDeviceClient::new(testing::strip_with_sockets());

        client
            .set_feature_value("strip-1-02", "state", serde_json::json!(false))
            .await
            .unwrap();

        let device = client.update().await.unwrap();
        let lamp = device.find("strip-1-02").unwrap();
        assert_eq!(lamp.feature("state").unwrap().value, serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_snapshot_client_unknown_feature() {
        let client = SnapshotDeviceClient::new(testing::strip_with_sockets());

        let err = client
            .set_feature_value("strip-1", "nope", serde_json::json!(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), DeviceErrorKind::Device);
    }

    #[test]
    fn test_snapshot_client_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        std::fs::write(&path, serde_json::to_string(&testing::strip_with_sockets()).unwrap())
            .unwrap();

        assert!(SnapshotDeviceClient::from_file(&path).is_ok());
        assert!(SnapshotDeviceClient::from_file(dir.path().join("missing.json")).is_err());
    }
}
