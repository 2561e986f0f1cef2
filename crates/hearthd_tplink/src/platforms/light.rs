use serde::Serialize;
use serde_json::json;

use super::Platform;
use super::PlatformEntity;
use super::bool_value;
use super::number_value;
use crate::device::Device;
use crate::device::Feature;
use crate::entity::ActionError;
use crate::entity::AttrError;
use crate::entity::CoordinatedEntity;
use crate::entity::Entity;
use crate::entity::IdentityError;
use crate::entity::SetupContext;
use crate::entity::coordinated::required_feature;
use crate::entity::enumerate::DEVICE_TYPES_WITH_SPECIALIZED_PLATFORMS;

const BRIGHTNESS_ID: &str = "brightness";
const STATE_ID: &str = "state";

/// Light entity for bulbs, light strips and dimmers.
///
/// Not backed by a single feature; reads `state` and `brightness` from the
/// device on every update.
#[derive(Debug, Clone, Default)]
pub struct Light {
    state: LightState,
}

/// State of a light entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LightState {
    pub is_on: Option<bool>,

    /// Brightness in percent, if supported
    pub brightness: Option<u8>,

    pub supports_brightness: bool,
}

impl Light {
    pub fn state(&self) -> &LightState {
        &self.state
    }
}

impl Entity for Light {
    fn platform(&self) -> Platform {
        Platform::Light
    }

    fn update_attrs(&mut self, device: &Device, _feature: Option<&Feature>) -> Result<(), AttrError> {
        let is_on = bool_value(required_feature(device, STATE_ID)?)?;
        let brightness = device
            .feature(BRIGHTNESS_ID)
            .map(number_value)
            .transpose()?
            .map(|b| b.clamp(0.0, 100.0).round() as u8);

        self.state = LightState {
            is_on: Some(is_on),
            brightness,
            supports_brightness: device.feature(BRIGHTNESS_ID).is_some(),
        };
        Ok(())
    }

    fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

impl PlatformEntity for Light {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        let device = ctx.coordinator.device();
        let mut entities = Vec::new();

        if DEVICE_TYPES_WITH_SPECIALIZED_PLATFORMS.contains(&device.device_type) {
            entities.push(CoordinatedEntity::new(
                &device,
                ctx.coordinator.clone(),
                None,
                None,
                Light::default(),
            )?);
        }

        for child in device
            .children
            .iter()
            .filter(|c| DEVICE_TYPES_WITH_SPECIALIZED_PLATFORMS.contains(&c.device_type))
        {
            entities.push(CoordinatedEntity::new(
                child,
                ctx.coordinator.clone(),
                None,
                Some(&*device),
                Light::default(),
            )?);
        }

        Ok(entities)
    }
}

impl CoordinatedEntity<Light> {
    /// Turn on, optionally setting brightness (percent) first.
    pub async fn turn_on(&self, brightness: Option<u8>) -> Result<(), ActionError> {
        let Some(brightness) = brightness else {
            return self.write_feature("turn_on", STATE_ID, json!(true)).await;
        };

        if !self.inner().state.supports_brightness || brightness > 100 {
            return Err(ActionError::InvalidInput {
                func: "turn_on",
                reason: format!("brightness {} is not supported by {}", brightness, self.entity_id()),
            });
        }
        self.write_features(
            "turn_on",
            vec![(BRIGHTNESS_ID, json!(brightness)), (STATE_ID, json!(true))],
        )
        .await
    }

    pub async fn turn_off(&self) -> Result<(), ActionError> {
        self.write_feature("turn_off", STATE_ID, json!(false)).await
    }
}
