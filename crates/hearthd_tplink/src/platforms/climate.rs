use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::Platform;
use super::PlatformEntity;
use super::bool_value;
use super::number_value;
use super::string_value;
use crate::device::Device;
use crate::device::DeviceType;
use crate::device::Feature;
use crate::entity::ActionError;
use crate::entity::AttrError;
use crate::entity::CoordinatedEntity;
use crate::entity::Entity;
use crate::entity::IdentityError;
use crate::entity::SetupContext;
use crate::entity::coordinated::required_feature;

const TEMPERATURE_ID: &str = "temperature";
const TARGET_TEMPERATURE_ID: &str = "target_temperature";
const STATE_ID: &str = "state";
const MODE_ID: &str = "mode";

/// Operating mode; thermostats only heat.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HvacMode {
    Heat,
    Off,
}

/// What the thermostat is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HvacAction {
    Idle,
    Heating,
    Off,
}

impl HvacAction {
    fn from_thermostat_state(state: &str) -> Self {
        match state {
            "idle" => HvacAction::Idle,
            "heating" => HvacAction::Heating,
            "off" => HvacAction::Off,
            other => {
                warn!("Unknown thermostat state {}, defaulting to OFF", other);
                HvacAction::Off
            }
        }
    }
}

/// Thermostat attached to a hub.
#[derive(Debug, Clone, Default)]
pub struct Climate {
    state: ClimateState,
}

/// Temperatures are in °C.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClimateState {
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub hvac_mode: Option<HvacMode>,
    pub hvac_action: Option<HvacAction>,
}

impl Climate {
    pub fn state(&self) -> &ClimateState {
        &self.state
    }
}

impl Entity for Climate {
    fn platform(&self) -> Platform {
        Platform::Climate
    }

    fn unique_id_override(&self, device: &Device) -> Option<String> {
        Some(format!("{}_climate", device.device_id))
    }

    fn update_attrs(&mut self, device: &Device, _feature: Option<&Feature>) -> Result<(), AttrError> {
        let target = required_feature(device, TARGET_TEMPERATURE_ID)?;
        let heating = bool_value(required_feature(device, STATE_ID)?)?;
        let mode = string_value(required_feature(device, MODE_ID)?)?;

        self.state = ClimateState {
            current_temperature: Some(number_value(required_feature(device, TEMPERATURE_ID)?)?),
            target_temperature: Some(number_value(target)?),
            min_temp: target.minimum_value,
            max_temp: target.maximum_value,
            hvac_mode: Some(if heating { HvacMode::Heat } else { HvacMode::Off }),
            hvac_action: Some(HvacAction::from_thermostat_state(&mode)),
        };
        Ok(())
    }

    fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

impl PlatformEntity for Climate {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        let device = ctx.coordinator.device();

        // Thermostats only exist as hub children
        device
            .children
            .iter()
            .filter(|c| c.device_type == DeviceType::Thermostat)
            .map(|child| {
                CoordinatedEntity::new(
                    child,
                    ctx.coordinator.clone(),
                    None,
                    Some(&*device),
                    Climate::default(),
                )
            })
            .collect()
    }
}

impl CoordinatedEntity<Climate> {
    /// Set the target temperature, truncated to whole degrees.
    pub async fn set_temperature(&self, temperature: f64) -> Result<(), ActionError> {
        let state = self.inner().state();
        let in_range = temperature.is_finite()
            && state.min_temp.map_or(true, |min| temperature >= min)
            && state.max_temp.map_or(true, |max| temperature <= max);
        if !in_range {
            return Err(ActionError::InvalidInput {
                func: "set_temperature",
                reason: format!("{} is out of range for {}", temperature, self.entity_id()),
            });
        }

        self.write_feature(
            "set_temperature",
            TARGET_TEMPERATURE_ID,
            json!(temperature as i64),
        )
        .await
    }

    pub async fn set_hvac_mode(&self, mode: HvacMode) -> Result<(), ActionError> {
        self.write_feature("set_hvac_mode", STATE_ID, json!(mode == HvacMode::Heat))
            .await
    }

    pub async fn turn_on(&self) -> Result<(), ActionError> {
        self.write_feature("turn_on", STATE_ID, json!(true)).await
    }

    pub async fn turn_off(&self) -> Result<(), ActionError> {
        self.write_feature("turn_off", STATE_ID, json!(false)).await
    }
}
