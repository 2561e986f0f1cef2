use std::sync::Arc;

use tracing::debug;

use super::coordinated::CoordinatedEntity;
use super::coordinated::Entity;
use super::description::DescriptionExtras;
use super::identity::IdentityError;
use crate::coordinator::Coordinator;
use crate::device::Device;
use crate::device::DeviceType;
use crate::device::Feature;
use crate::device::FeatureCategory;
use crate::device::FeatureType;

/// Device types whose primary feature is modelled by a dedicated platform.
///
/// A bulb's on/off state belongs to its light entity, not to a generic
/// switch.
pub const DEVICE_TYPES_WITH_SPECIALIZED_PLATFORMS: &[DeviceType] =
    &[DeviceType::Bulb, DeviceType::LightStrip, DeviceType::Dimmer];

/// Shared inputs for creating the entities of one coordinator.
#[derive(Clone)]
pub struct SetupContext {
    pub coordinator: Arc<dyn Coordinator>,
    /// Base description options applied to every feature entity
    pub extras: DescriptionExtras,
}

impl SetupContext {
    pub fn new(coordinator: Arc<dyn Coordinator>) -> Self {
        Self {
            coordinator,
            extras: DescriptionExtras::default(),
        }
    }

    pub fn with_extras(mut self, extras: DescriptionExtras) -> Self {
        self.extras = extras;
        self
    }
}

/// An entity created from a single feature.
pub trait FeatureEntity: Entity + Sized {
    /// Feature type this entity is created for
    const FEATURE_TYPE: FeatureType;

    fn from_feature(feature: &Feature, extras: DescriptionExtras) -> Self;
}

/// Whether `feature` of `device` becomes an entity of `feature_type`.
pub fn feature_qualifies(device: &Device, feature: &Feature, feature_type: FeatureType) -> bool {
    feature.feature_type == feature_type
        && (feature.category != FeatureCategory::Primary
            || !DEVICE_TYPES_WITH_SPECIALIZED_PLATFORMS.contains(&device.device_type))
}

/// Entities for the qualifying features of a single device.
pub fn entities_for_device<E: FeatureEntity>(
    ctx: &SetupContext,
    device: &Device,
    parent: Option<&Device>,
) -> Result<Vec<CoordinatedEntity<E>>, IdentityError> {
    device
        .features
        .iter()
        .filter(|feature| feature_qualifies(device, feature, E::FEATURE_TYPE))
        .map(|feature| {
            CoordinatedEntity::new(
                device,
                ctx.coordinator.clone(),
                Some(feature),
                parent,
                E::from_feature(feature, ctx.extras.clone()),
            )
        })
        .collect()
}

/// Entities for a device and its children, children first.
pub fn entities_for_device_and_its_children<E: FeatureEntity>(
    ctx: &SetupContext,
    device: &Device,
) -> Result<Vec<CoordinatedEntity<E>>, IdentityError> {
    let mut entities = Vec::new();

    if !device.children.is_empty() {
        debug!("Initializing device with {} children", device.children.len());
        for child in &device.children {
            entities.extend(entities_for_device::<E>(ctx, child, Some(device))?);
        }
    }

    entities.extend(entities_for_device::<E>(ctx, device, None)?);

    Ok(entities)
}
