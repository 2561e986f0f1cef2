use serde::Serialize;
use serde_json::json;

use super::Platform;
use super::PlatformEntity;
use super::bool_value;
use crate::device::Device;
use crate::device::Feature;
use crate::device::FeatureType;
use crate::entity::ActionError;
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

/// On/off feature such as a socket relay or a status LED.
#[derive(Debug, Clone)]
pub struct Switch {
    description: EntityDescription,
    state: SwitchState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SwitchState {
    pub is_on: Option<bool>,
}

impl Switch {
    pub fn is_on(&self) -> Option<bool> {
        self.state.is_on
    }
}

impl Entity for Switch {
    fn platform(&self) -> Platform {
        Platform::Switch
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

impl FeatureEntity for Switch {
    const FEATURE_TYPE: FeatureType = FeatureType::Switch;

    fn from_feature(feature: &Feature, extras: DescriptionExtras) -> Self {
        Self {
            description: description_for_feature(feature, extras),
            state: SwitchState::default(),
        }
    }
}

impl PlatformEntity for Switch {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        entities_for_device_and_its_children(ctx, &ctx.coordinator.device())
    }
}

impl CoordinatedEntity<Switch> {
    pub async fn turn_on(&self) -> Result<(), ActionError> {
        self.write_own_feature("turn_on", json!(true)).await
    }

    pub async fn turn_off(&self) -> Result<(), ActionError> {
        self.write_own_feature("turn_off", json!(false)).await
    }
}
