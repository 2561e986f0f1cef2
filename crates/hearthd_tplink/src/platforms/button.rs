use serde_json::json;

use super::Platform;
use super::PlatformEntity;
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

/// Stateless action such as reboot or factory reset.
#[derive(Debug, Clone)]
pub struct Button {
    description: EntityDescription,
}

impl Entity for Button {
    fn platform(&self) -> Platform {
        Platform::Button
    }

    fn description(&self) -> Option<&EntityDescription> {
        Some(&self.description)
    }

    fn update_attrs(&mut self, _device: &Device, _feature: Option<&Feature>) -> Result<(), AttrError> {
        Ok(())
    }

    fn state_json(&self) -> serde_json::Value {
        json!({})
    }
}

impl FeatureEntity for Button {
    const FEATURE_TYPE: FeatureType = FeatureType::Action;

    fn from_feature(feature: &Feature, extras: DescriptionExtras) -> Self {
        Self {
            description: description_for_feature(feature, extras),
        }
    }
}

impl PlatformEntity for Button {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        entities_for_device_and_its_children(ctx, &ctx.coordinator.device())
    }
}

impl CoordinatedEntity<Button> {
    pub async fn press(&self) -> Result<(), ActionError> {
        self.write_own_feature("press", json!(true)).await
    }
}
