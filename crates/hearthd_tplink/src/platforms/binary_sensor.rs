use serde::Serialize;

use super::Platform;
use super::PlatformEntity;
use super::bool_value;
use crate::device::Device;
use crate::device::Feature;
use crate::device::FeatureType;
use crate::entity::AttrError;
use crate::entity::CoordinatedEntity;
use crate::entity::DescriptionExtras;
use crate::entity::Entity;
use crate::entity::EntityDescription;
use crate::entity::FeatureEntity;
use crate::entity::IdentityError;
use crate::entity::SetupContext;
use crate::entity::description::description_for_feature;
use crate::entity::enumerate::entities_for_device_and_its_children;

/// Binary sensor entity (overheating, battery low, cloud connection, ...)
#[derive(Debug, Clone)]
pub struct BinarySensor {
    description: EntityDescription,
    state: BinarySensorState,
}

/// State of a binary sensor entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BinarySensorState {
    pub is_on: Option<bool>,
}

impl BinarySensor {
    pub fn is_on(&self) -> Option<bool> {
        self.state.is_on
    }
}

impl Entity for BinarySensor {
    fn platform(&self) -> Platform {
        Platform::BinarySensor
    }

    fn description(&self) -> Option<&EntityDescription> {
        Some(&self.description)
    }

    fn update_attrs(&mut self, _device: &Device, feature: Option<&Feature>) -> Result<(), AttrError> {
        if let Some(feature) = feature {
            self.state.is_on = Some(bool_value(feature)?);
        }
        Ok(())
    }

    fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

impl FeatureEntity for BinarySensor {
    const FEATURE_TYPE: FeatureType = FeatureType::BinarySensor;

    fn from_feature(feature: &Feature, extras: DescriptionExtras) -> Self {
        Self {
            description: description_for_feature(feature, extras),
            state: BinarySensorState::default(),
        }
    }
}

impl PlatformEntity for BinarySensor {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        entities_for_device_and_its_children(ctx, &ctx.coordinator.device())
    }
}
