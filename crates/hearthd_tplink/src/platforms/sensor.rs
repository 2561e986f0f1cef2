use serde::Serialize;

use super::Platform;
use super::PlatformEntity;
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

/// Read-only measurement or informational value.
#[derive(Debug, Clone)]
pub struct Sensor {
    description: EntityDescription,
    state: SensorState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorState {
    /// Scalar reported by the device, `null` when it has no reading
    pub native_value: serde_json::Value,
    pub native_unit_of_measurement: Option<String>,
}

impl Sensor {
    pub fn native_value(&self) -> &serde_json::Value {
        &self.state.native_value
    }
}

impl Entity for Sensor {
    fn platform(&self) -> Platform {
        Platform::Sensor
    }

    fn description(&self) -> Option<&EntityDescription> {
        Some(&self.description)
    }

    fn update_attrs(&mut self, _device: &Device, feature: Option<&Feature>) -> Result<(), AttrError> {
        let Some(feature) = feature else {
            return Ok(());
        };

        if feature.value.is_array() || feature.value.is_object() {
            return Err(AttrError::UnexpectedValue {
                feature: feature.id.clone(),
                expected: "scalar",
                found: feature.value.clone(),
            });
        }

        self.state.native_value = feature.value.clone();
        self.state.native_unit_of_measurement = feature
            .unit
            .clone()
            .or_else(|| self.description.native_unit_of_measurement.clone());
        Ok(())
    }

    fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

impl FeatureEntity for Sensor {
    const FEATURE_TYPE: FeatureType = FeatureType::Sensor;

    fn from_feature(feature: &Feature, extras: DescriptionExtras) -> Self {
        Self {
            description: description_for_feature(feature, extras),
            state: SensorState::default(),
        }
    }
}

impl PlatformEntity for Sensor {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        entities_for_device_and_its_children(ctx, &ctx.coordinator.device())
    }
}
