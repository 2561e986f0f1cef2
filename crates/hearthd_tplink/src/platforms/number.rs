use serde::Serialize;
use serde_json::json;

use super::Platform;
use super::PlatformEntity;
use super::number_value;
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

/// Numeric setting with an optional range.
#[derive(Debug, Clone)]
pub struct Number {
    description: EntityDescription,
    state: NumberState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NumberState {
    pub native_value: Option<f64>,
    pub native_min_value: Option<f64>,
    pub native_max_value: Option<f64>,
}

impl Number {
    pub fn native_value(&self) -> Option<f64> {
        self.state.native_value
    }

    fn in_range(&self, value: f64) -> bool {
        self.state.native_min_value.map_or(true, |min| value >= min)
            && self.state.native_max_value.map_or(true, |max| value <= max)
    }
}

impl Entity for Number {
    fn platform(&self) -> Platform {
        Platform::Number
    }

    fn description(&self) -> Option<&EntityDescription> {
        Some(&self.description)
    }

    fn update_attrs(&mut self, _device: &Device, feature: Option<&Feature>) -> Result<(), AttrError> {
        if let Some(feature) = feature {
            self.state.native_value = Some(number_value(feature)?);
            self.state.native_min_value = feature.minimum_value;
            self.state.native_max_value = feature.maximum_value;
        }
        Ok(())
    }

    fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

impl FeatureEntity for Number {
    const FEATURE_TYPE: FeatureType = FeatureType::Number;

    fn from_feature(feature: &Feature, extras: DescriptionExtras) -> Self {
        Self {
            description: description_for_feature(feature, extras),
            state: NumberState {
                native_value: None,
                native_min_value: feature.minimum_value,
                native_max_value: feature.maximum_value,
            },
        }
    }
}

impl PlatformEntity for Number {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        entities_for_device_and_its_children(ctx, &ctx.coordinator.device())
    }
}

impl CoordinatedEntity<Number> {
    /// Set the value, which must lie within the feature's range.
    pub async fn set_native_value(&self, value: f64) -> Result<(), ActionError> {
        if !value.is_finite() || !self.inner().in_range(value) {
            return Err(ActionError::InvalidInput {
                func: "set_native_value",
                reason: format!("{} is out of range for {}", value, self.entity_id()),
            });
        }
        // Device number features take integers
        self.write_own_feature("set_native_value", json!(value as i64))
            .await
    }
}
