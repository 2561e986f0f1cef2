//! Shared device state refreshed on behalf of every entity of one device.

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tracing::info;
use tracing::warn;

use crate::device;
use crate::device::Device;
use crate::device::DeviceClient;
use crate::device::DeviceError;

/// What entities need from the component that owns the device snapshot.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Latest device snapshot.
    fn device(&self) -> Arc<Device>;

    /// Whether the most recent refresh succeeded.
    fn last_update_success(&self) -> bool;

    /// Ask for the snapshot to be refreshed.
    async fn request_refresh(&self);

    /// Start the re-authentication flow for this device.
    fn start_reauth(&self);

    /// Client used for writes.
    fn client(&self) -> &dyn DeviceClient;

    /// Stable per-device key preserved from older releases.
    fn legacy_device_id(&self, device: &Device) -> String {
        device::legacy_device_id(device)
    }
}

/// Coordinator for one root device, backed by a [`DeviceClient`].
pub struct DeviceCoordinator<C: DeviceClient> {
    client: C,
    device: RwLock<Arc<Device>>,
    last_update_success: AtomicBool,
    reauth_requested: AtomicBool,
}

impl<C: DeviceClient> DeviceCoordinator<C> {
    /// Create a coordinator from the initial snapshot obtained during setup.
    pub fn new(client: C, device: Device) -> Self {
        Self {
            client,
            device: RwLock::new(Arc::new(device)),
            last_update_success: AtomicBool::new(true),
            reauth_requested: AtomicBool::new(false),
        }
    }

    /// Perform the initial fetch and build a coordinator around it.
    pub async fn connect(client: C) -> Result<Self, DeviceError> {
        let device = client.update().await?;
        Ok(Self::new(client, device))
    }

    /// Fetch a new snapshot.
    ///
    /// The previous snapshot is kept when the fetch fails.
    pub async fn refresh(&self) -> Result<(), DeviceError> {
        match self.client.update().await {
            Ok(device) => {
                match self.device.write() {
                    Ok(mut guard) => *guard = Arc::new(device),
                    Err(poisoned) => *poisoned.into_inner() = Arc::new(device),
                }
                self.last_update_success.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                if self.last_update_success.swap(false, Ordering::SeqCst) {
                    warn!("Failed to refresh device: {}", e);
                }
                if matches!(e, DeviceError::Authentication(_)) {
                    self.start_reauth();
                }
                Err(e)
            }
        }
    }

    /// Whether re-authentication has been requested since creation.
    pub fn reauth_requested(&self) -> bool {
        self.reauth_requested.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: DeviceClient> Coordinator for DeviceCoordinator<C> {
    fn device(&self) -> Arc<Device> {
        match self.device.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    async fn request_refresh(&self) {
        // Failures are already reflected in last_update_success
        let _ = self.refresh().await;
    }

    fn start_reauth(&self) {
        if !self.reauth_requested.swap(true, Ordering::SeqCst) {
            info!("Starting re-authentication for {}", self.device().alias);
        }
    }

    fn client(&self) -> &dyn DeviceClient {
        &self.client
    }
}
