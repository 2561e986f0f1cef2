use std::sync::Arc;

use tracing::warn;

use super::action::ActionError;
use super::action::refresh_after;
use super::description::EntityDescription;
use super::identity::EntityIdentity;
use super::identity::IdentityError;
use super::identity::IdentityRequest;
use super::identity::resolve_identity;
use crate::coordinator::Coordinator;
use crate::device::Device;
use crate::device::DeviceError;
use crate::device::Feature;
use crate::platforms::Platform;

/// Failure while deriving entity attributes from a snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AttrError {
    #[error("device {0} is missing from the snapshot")]
    MissingDevice(String),

    #[error("feature {feature} is missing on device {device_id}")]
    MissingFeature { device_id: String, feature: String },

    #[error("unexpected value for {feature}: expected {expected}, found {found}")]
    UnexpectedValue {
        feature: String,
        expected: &'static str,
        found: serde_json::Value,
    },
}

/// Platform-specific part of an entity.
///
/// All entities (lights, switches, sensors, etc.) implement this trait.
pub trait Entity: Send + Sync {
    /// Platform this entity belongs to
    fn platform(&self) -> Platform;

    /// Description derived from the backing feature, if any
    fn description(&self) -> Option<&EntityDescription> {
        None
    }

    /// Unique id fixed by the entity instead of derived from its feature
    fn unique_id_override(&self, _device: &Device) -> Option<String> {
        None
    }

    /// Refresh internal attributes from the latest snapshot.
    ///
    /// Called on every coordinator update. `feature` is the backing feature
    /// for feature-based entities. Errors only make this entity unavailable.
    fn update_attrs(&mut self, device: &Device, feature: Option<&Feature>) -> Result<(), AttrError>;

    /// Serialize current state to JSON
    fn state_json(&self) -> serde_json::Value;
}

/// Look up a feature another feature-less entity depends on.
pub fn required_feature<'a>(device: &'a Device, id: &str) -> Result<&'a Feature, AttrError> {
    device.feature(id).ok_or_else(|| AttrError::MissingFeature {
        device_id: device.device_id.clone(),
        feature: id.to_string(),
    })
}

/// An entity bound to a coordinator.
///
/// Holds the identity computed at construction and tracks availability across
/// coordinator updates.
pub struct CoordinatedEntity<E: Entity> {
    coordinator: Arc<dyn Coordinator>,
    device_id: String,
    device_alias: String,
    feature_id: Option<String>,
    identity: EntityIdentity,
    entity_id: String,
    available: bool,
    inner: E,
}

impl<E: Entity> CoordinatedEntity<E> {
    /// Bind `inner` to `device`, optionally backed by `feature` and attached
    /// below `parent`.
    pub fn new(
        device: &Device,
        coordinator: Arc<dyn Coordinator>,
        feature: Option<&Feature>,
        parent: Option<&Device>,
        inner: E,
    ) -> Result<Self, IdentityError> {
        let request = IdentityRequest::new(device, inner.platform())
            .feature(feature)
            .parent(parent)
            .description_key(inner.description().map(|d| d.key.as_str()))
            .unique_id_override(inner.unique_id_override(device));
        let identity = resolve_identity(&request, &|d: &Device| coordinator.legacy_device_id(d))?;

        let name = identity
            .name
            .as_deref()
            .or_else(|| inner.description().map(|d| d.name.as_str()));
        let entity_id = entity_id_for(inner.platform(), &identity.device_info.name, name);

        Ok(Self {
            coordinator,
            device_id: device.device_id.clone(),
            device_alias: device.alias.clone(),
            feature_id: feature.map(|f| f.id.clone()),
            identity,
            entity_id,
            available: true,
            inner,
        })
    }

    pub fn identity(&self) -> &EntityIdentity {
        &self.identity
    }

    pub fn unique_id(&self) -> &str {
        &self.identity.unique_id
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub(crate) fn set_entity_id(&mut self, entity_id: String) {
        self.entity_id = entity_id;
    }

    /// Device this entity reads its state from
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn feature_id(&self) -> Option<&str> {
        self.feature_id.as_deref()
    }

    /// Entity name, `None` when the entity represents the device itself
    pub fn name(&self) -> Option<&str> {
        self.identity
            .name
            .as_deref()
            .or_else(|| self.inner.description().map(|d| d.name.as_str()))
    }

    pub fn enabled_by_default(&self) -> bool {
        self.inner
            .description()
            .map_or(true, |d| d.entity_registry_enabled_default)
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Availability reported to the platform.
    ///
    /// A failed coordinator refresh makes every entity unavailable; a failed
    /// attribute update only this one.
    pub fn available(&self) -> bool {
        self.coordinator.last_update_success() && self.available
    }

    /// Re-derive attributes from the coordinator's current snapshot.
    pub fn handle_coordinator_update(&mut self) {
        let snapshot = self.coordinator.device();
        match self.update_attrs(&snapshot) {
            Ok(()) => self.available = true,
            Err(e) => {
                // Only the transition is logged
                if self.available {
                    warn!(
                        "Unable to read data for {} ({}) {}: {}",
                        self.device_alias, self.device_id, self.entity_id, e
                    );
                }
                self.available = false;
            }
        }
    }

    fn update_attrs(&mut self, snapshot: &Device) -> Result<(), AttrError> {
        let device = snapshot
            .find(&self.device_id)
            .ok_or_else(|| AttrError::MissingDevice(self.device_id.clone()))?;

        let feature = match &self.feature_id {
            Some(id) => Some(required_feature(device, id)?),
            None => None,
        };

        self.inner.update_attrs(device, feature)
    }

    /// Write `value` to a feature of this entity's device, then refresh.
    pub async fn write_feature(
        &self,
        func: &'static str,
        feature_id: &str,
        value: serde_json::Value,
    ) -> Result<(), ActionError> {
        let client = self.coordinator.client();
        refresh_after(
            self.coordinator.as_ref(),
            func,
            client.set_feature_value(&self.device_id, feature_id, value),
        )
        .await
    }

    /// Write several features in order as one action, then refresh.
    ///
    /// Stops at the first failed write.
    pub async fn write_features(
        &self,
        func: &'static str,
        writes: Vec<(&str, serde_json::Value)>,
    ) -> Result<(), ActionError> {
        let client = self.coordinator.client();
        let device_id = self.device_id.as_str();
        refresh_after(self.coordinator.as_ref(), func, async move {
            for (feature_id, value) in writes {
                client.set_feature_value(device_id, feature_id, value).await?;
            }
            Ok::<(), DeviceError>(())
        })
        .await
    }

    /// Write to the feature backing this entity.
    pub(crate) async fn write_own_feature(
        &self,
        func: &'static str,
        value: serde_json::Value,
    ) -> Result<(), ActionError> {
        match &self.feature_id {
            Some(feature_id) => self.write_feature(func, feature_id, value).await,
            None => Err(ActionError::InvalidInput {
                func,
                reason: format!("{} is not backed by a feature", self.entity_id),
            }),
        }
    }
}

/// `"<platform>.<slug>"` from the registry device name and entity name.
pub fn entity_id_for(platform: Platform, device_name: &str, name: Option<&str>) -> String {
    let full = match name {
        Some(name) => format!("{} {}", device_name, name),
        None => device_name.to_string(),
    };
    format!("{}.{}", platform, slugify(&full))
}

/// Lower-case, with runs of non-alphanumerics collapsed to `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("unnamed");
    }
    slug
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::device::FeatureCategory;
    use crate::device::FeatureType;
    use crate::entity::description::DescriptionExtras;
    use crate::entity::description::description_for_feature;
    use crate::testing;
    use crate::testing::WarnCounter;

    /// Entity whose update fails while the shared flag is set
    struct Flaky {
        description: EntityDescription,
        fail: Arc<AtomicBool>,
        updates: usize,
    }

    impl Entity for Flaky {
        fn platform(&self) -> Platform {
            Platform::Sensor
        }

        fn description(&self) -> Option<&EntityDescription> {
            Some(&self.description)
        }

        fn update_attrs(&mut self, _device: &Device, feature: Option<&Feature>) -> Result<(), AttrError> {
            self.updates += 1;
            if self.fail.load(Ordering::SeqCst) {
                return Err(AttrError::UnexpectedValue {
                    feature: feature.map(|f| f.id.clone()).unwrap_or_default(),
                    expected: "number",
                    found: serde_json::Value::Null,
                });
            }
            Ok(())
        }

        fn state_json(&self) -> serde_json::Value {
            serde_json::json!({ "updates": self.updates })
        }
    }

    fn flaky_entity() -> (
        CoordinatedEntity<Flaky>,
        Arc<AtomicBool>,
        testing::MockDeviceClient,
        Arc<crate::coordinator::DeviceCoordinator<testing::MockDeviceClient>>,
    ) {
        let plug = testing::plug("8006A1B2C3", "Kettle");
        let (coordinator, client) = testing::coordinator(plug.clone());
        let fail = Arc::new(AtomicBool::new(false));
        let feature = plug.feature("rssi").unwrap();
        let inner = Flaky {
            description: description_for_feature(feature, DescriptionExtras::default()),
            fail: fail.clone(),
            updates: 0,
        };
        let entity = CoordinatedEntity::new(&plug, coordinator.clone(), Some(feature), None, inner).unwrap();
        (entity, fail, client, coordinator)
    }

    #[test]
    fn test_initially_available() {
        let (entity, _, _, _) = flaky_entity();
        assert!(entity.available());
        assert_eq!(entity.unique_id(), "8006A1B2C3_rssi");
        assert_eq!(entity.entity_id(), "sensor.kettle_rssi");
        assert_eq!(entity.name(), Some("RSSI"));
        assert!(entity.enabled_by_default());
    }

    #[test]
    fn test_failure_then_success_logs_once() {
        let (mut entity, fail, _, _) = flaky_entity();
        let counter = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());

        tracing::subscriber::with_default(subscriber, || {
            fail.store(true, Ordering::SeqCst);
            entity.handle_coordinator_update();
            assert!(!entity.available());
            entity.handle_coordinator_update();
            entity.handle_coordinator_update();
            assert!(!entity.available());

            fail.store(false, Ordering::SeqCst);
            entity.handle_coordinator_update();
            assert!(entity.available());
        });

        assert_eq!(counter.count(), 1);
        assert_eq!(entity.inner().updates, 4);
    }

    #[test]
    fn test_success_is_idempotent() {
        let (mut entity, _, _, _) = flaky_entity();
        entity.handle_coordinator_update();
        entity.handle_coordinator_update();
        assert!(entity.available());
    }

    #[tokio::test]
    async fn test_failed_coordinator_refresh_masks_entity() {
        let (mut entity, _, client, coordinator) = flaky_entity();

        client.fail_updates(DeviceError::Timeout("no answer".to_string()));
        coordinator.request_refresh().await;
        entity.handle_coordinator_update();

        // The entity itself parsed fine; the refresh did not
        assert!(!entity.available());

        client.succeed_updates();
        coordinator.request_refresh().await;
        entity.handle_coordinator_update();
        assert!(entity.available());
    }

    #[tokio::test]
    async fn test_missing_feature_makes_unavailable() {
        let (mut entity, _, client, coordinator) = flaky_entity();

        client.edit(|d| d.features.retain(|f| f.id != "rssi"));
        coordinator.request_refresh().await;
        entity.handle_coordinator_update();

        assert!(coordinator.last_update_success());
        assert!(!entity.available());
    }

    #[test]
    fn test_debug_feature_disabled_by_default() {
        let plug = testing::plug("8006A1B2C3", "Kettle");
        let (coordinator, _) = testing::coordinator(plug.clone());
        let feature = Feature::new("on_since", "On since", FeatureType::Sensor, FeatureCategory::Debug);
        let inner = Flaky {
            description: description_for_feature(&feature, DescriptionExtras::default()),
            fail: Arc::new(AtomicBool::new(false)),
            updates: 0,
        };

        let entity = CoordinatedEntity::new(&plug, coordinator, Some(&feature), None, inner).unwrap();
        assert!(!entity.enabled_by_default());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Power Strip Kettle"), "power_strip_kettle");
        assert_eq!(slugify("  Desk -- Lamp (2) "), "desk_lamp_2");
        assert_eq!(slugify("!!!"), "unnamed");
    }

    #[test]
    fn test_entity_id_without_name() {
        assert_eq!(entity_id_for(Platform::Light, "Desk Lamp", None), "light.desk_lamp");
        assert_eq!(
            entity_id_for(Platform::Switch, "Hall", Some("Ceiling Fan")),
            "switch.hall_ceiling_fan"
        );
    }
}
